//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format construction chains, call sites,
//! class names and suggestions in error output.

use std::cmp::Reverse;

/// Separator placed between the links of a construction chain.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Renders a construction chain as a readable string.
///
/// # Examples
/// ```
/// use injecta_support::rendering::render_chain;
///
/// let chain = vec!["UserService", "UserRepo", "Database", "UserService"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "UserService -> UserRepo -> Database -> UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(CHAIN_SEPARATOR)
}

/// Renders the place a parameter belongs to, `Owner::method` or just
/// `method` for free functions and closures.
///
/// ```
/// use injecta_support::rendering::render_callsite;
///
/// assert_eq!(render_callsite(Some("User"), "set_name"), "User::set_name");
/// assert_eq!(render_callsite(None, "{closure}"), "{closure}");
/// ```
pub fn render_callsite(owner: Option<&str>, method: &str) -> String {
    match owner {
        Some(owner) => format!("{owner}::{method}"),
        None => method.to_string(),
    }
}

/// Shortest shared prefix that still counts as a near miss.
const MIN_SHARED_PREFIX: usize = 3;

/// The last `::` segment of a class name.
///
/// ```
/// use injecta_support::rendering::short_name;
///
/// assert_eq!(short_name("service::AuthService"), "AuthService");
/// assert_eq!(short_name("Counter"), "Counter");
/// ```
pub fn short_name(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

/// "Did you mean" candidates for an unknown class name, best first.
///
/// Case-insensitive matches come first, then names containing one
/// another or sharing the short name, then names sharing a prefix of at
/// least three characters (longer prefixes first). Ties keep
/// alphabetical order.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let wanted = requested.to_lowercase();
    let wanted_short = short_name(&wanted);

    let mut ranked: Vec<(u8, Reverse<usize>, &str)> = available
        .iter()
        .copied()
        .filter(|&name| name != requested)
        .filter_map(|name| {
            let lower = name.to_lowercase();
            let short = short_name(&lower);

            if lower == wanted {
                Some((0, Reverse(0), name))
            } else if lower.contains(&wanted) || wanted.contains(&lower) || short == wanted_short {
                Some((1, Reverse(0), name))
            } else {
                let shared = short
                    .chars()
                    .zip(wanted_short.chars())
                    .take_while(|(a, b)| a == b)
                    .count();
                (shared >= MIN_SHARED_PREFIX).then_some((2, Reverse(shared), name))
            }
        })
        .collect();

    ranked.sort_unstable();
    ranked
        .into_iter()
        .take(max_suggestions)
        .map(|(_, _, name)| name.to_string())
        .collect()
}
