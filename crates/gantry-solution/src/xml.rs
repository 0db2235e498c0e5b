//! Minimal XML-subset helpers for descriptor files
//!
//! Handles the handful of shapes project descriptors actually use. Not a
//! general XML parser.

/// Extract the first `<element>value</element>` value.
pub(crate) fn element(content: &str, element: &str) -> Option<String> {
    let start_tag = format!("<{}>", element);
    let end_tag = format!("</{}>", element);

    if let Some(start) = content.find(&start_tag) {
        if let Some(end) = content[start..].find(&end_tag) {
            let value_start = start + start_tag.len();
            let value_end = start + end;
            let value = content[value_start..value_end].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Extract every `<element attrs>body</element>` occurrence as
/// `(attributes, body)` pairs, in document order. Self-closing occurrences
/// yield an empty body.
pub(crate) fn blocks(content: &str, element: &str) -> Vec<(String, String)> {
    let start_tag = format!("<{}", element);
    let end_tag = format!("</{}>", element);
    let mut found = Vec::new();

    let mut pos = 0;
    while let Some(offset) = content[pos..].find(&start_tag) {
        let start = pos + offset;
        // The match must be a full tag name, not a prefix of a longer one.
        let after = start + start_tag.len();
        match content[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
            _ => {
                pos = after;
                continue;
            }
        }

        let Some(tag_close) = content[start..].find('>') else {
            break;
        };
        let tag_close = start + tag_close;
        let attrs = content[after..tag_close].trim_end_matches('/').trim();

        if content[..tag_close].ends_with('/') {
            found.push((attrs.to_string(), String::new()));
            pos = tag_close + 1;
            continue;
        }

        let body_start = tag_close + 1;
        let Some(end) = content[body_start..].find(&end_tag) else {
            break;
        };
        found.push((
            attrs.to_string(),
            content[body_start..body_start + end].to_string(),
        ));
        pos = body_start + end + end_tag.len();
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_extraction() {
        let content = "<Project><ProjectGuid>{ABC}</ProjectGuid></Project>";
        assert_eq!(element(content, "ProjectGuid"), Some("{ABC}".to_string()));
        assert_eq!(element(content, "AssemblyName"), None);
    }

    #[test]
    fn test_blocks_with_attributes() {
        let content = r#"
            <PropertyGroup Condition="a">
              <OutputPath>bin\x</OutputPath>
            </PropertyGroup>
            <PropertyGroup>
              <OutputPath>bin\y</OutputPath>
            </PropertyGroup>
        "#;
        let found = blocks(content, "PropertyGroup");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, r#"Condition="a""#);
        assert!(found[0].1.contains("bin\\x"));
        assert_eq!(found[1].0, "");
    }

    #[test]
    fn test_blocks_self_closing() {
        let content = r#"<Reference Include="Xamarin.UITest" /><Reference Include="nunit.framework"></Reference>"#;
        let found = blocks(content, "Reference");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, r#"Include="Xamarin.UITest""#);
        assert!(found[0].1.is_empty());
    }

    #[test]
    fn test_blocks_name_is_not_prefix_matched() {
        // <ProjectReference> must not be picked up as a <Project> block
        let content = "<ProjectReference Include=\"x\"><Project>{G}</Project></ProjectReference>";
        let found = blocks(content, "Project");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, "{G}");
    }
}
