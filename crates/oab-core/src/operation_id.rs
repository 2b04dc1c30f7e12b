//! Operation identifiers derived from method and path.

use heck::{ToLowerCamelCase, ToPascalCase};

use crate::ir::HttpMethod;

/// Derive a lowerCamelCase operation id from an HTTP method and path.
///
/// A resource segment followed by a path parameter names one element and is
/// singularized:
/// - `GET /items` → `listItems`
/// - `GET /items/{id}` → `getItem`
/// - `POST /items` → `createItems`
/// - `GET /users/{userId}/messages` → `listUserMessages`
/// - `DELETE /users/{userId}/messages/{messageId}` → `deleteUserMessage`
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut words: Vec<String> = Vec::new();
    let mut ends_with_param = false;
    for (i, seg) in segments.iter().enumerate() {
        if is_param(seg) {
            ends_with_param = true;
            continue;
        }
        ends_with_param = false;
        let followed_by_param = segments.get(i + 1).is_some_and(|next| is_param(next));
        let word = if followed_by_param {
            singularize(seg)
        } else {
            (*seg).to_string()
        };
        words.push(word.to_pascal_case());
    }

    let verb = match method {
        HttpMethod::Get if ends_with_param || words.is_empty() => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        HttpMethod::Delete => "delete",
        HttpMethod::Patch => "patch",
        HttpMethod::Options => "options",
        HttpMethod::Head => "head",
        HttpMethod::Trace => "trace",
        HttpMethod::Query => "query",
    };

    format!("{verb} {}", words.join(" ")).to_lower_camel_case()
}

fn is_param(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

/// Naive singularization: `categories` → `category`, `boxes` → `box`,
/// `items` → `item`.
fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies")
        && !stem.is_empty()
    {
        format!("{stem}y")
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_get() {
        assert_eq!(derive_operation_id(HttpMethod::Get, "/items"), "listItems");
        assert_eq!(derive_operation_id(HttpMethod::Get, "/items/{id}"), "getItem");
    }

    #[test]
    fn test_write_methods() {
        assert_eq!(derive_operation_id(HttpMethod::Post, "/items"), "createItems");
        assert_eq!(
            derive_operation_id(HttpMethod::Put, "/items/{id}"),
            "updateItem"
        );
        assert_eq!(
            derive_operation_id(HttpMethod::Delete, "/items/{id}"),
            "deleteItem"
        );
    }

    #[test]
    fn test_nested_resources() {
        assert_eq!(
            derive_operation_id(HttpMethod::Get, "/users/{userId}/messages"),
            "listUserMessages"
        );
        assert_eq!(
            derive_operation_id(HttpMethod::Delete, "/users/{userId}/messages/{messageId}"),
            "deleteUserMessage"
        );
    }

    #[test]
    fn test_kebab_segments_and_root() {
        assert_eq!(
            derive_operation_id(HttpMethod::Get, "/pet-categories/{id}"),
            "getPetCategory"
        );
        assert_eq!(derive_operation_id(HttpMethod::Get, "/"), "get");
        assert_eq!(derive_operation_id(HttpMethod::Query, "/search"), "querySearch");
    }
}
