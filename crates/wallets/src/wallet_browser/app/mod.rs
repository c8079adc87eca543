pub(crate) mod contents {
    /// Replaced with the server's session token when the page is served.
    pub(crate) const TOKEN_PLACEHOLDER: &str = "__VELLUM_SESSION_TOKEN__";

    pub(crate) const INDEX_HTML: &str = include_str!("index.html");
}
