/// Convert a rendered chat reply (HTML) to markdown.
pub fn html_to_markdown(html: &str) -> String {
    html2md::parse_html(html, false).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_basic_markup() {
        let markdown = html_to_markdown("<h1>Title</h1><p>Hello <strong>world</strong></p>");
        assert!(markdown.starts_with("# Title"), "{markdown}");
        assert!(markdown.contains("**world**"), "{markdown}");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let markdown = html_to_markdown("\n  <p>plain</p>  \n");
        assert_eq!(markdown, "plain");
    }
}
