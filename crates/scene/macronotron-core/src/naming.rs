//! Name helpers shared by the scene model and hosts.

/// Separator of composite `puppet:member` keys.
pub const MEMBER_KEY_SEP: char = ':';

/// Composite key used by hosts to address one member across puppets.
pub fn member_key(puppet: &str, member: &str) -> String {
    format!("{puppet}{MEMBER_KEY_SEP}{member}")
}

/// Split a composite key on its first separator.
pub fn split_member_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(MEMBER_KEY_SEP)
}

/// `base` if unused, else the first free `base_N` with N counting from 1.
pub fn unique_name<'a, I>(base: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: hashbrown::HashSet<&str> = existing.into_iter().collect();
    if !taken.contains(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|i| format!("{base}_{i}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}
