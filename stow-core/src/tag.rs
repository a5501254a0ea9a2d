use crate::{PersistError, Result};

/// Parsed field annotation: `name[,pk][,ro][,fk][,inline]`.
///
/// ```rust
/// use stow_core::Tag;
/// let tag = Tag::parse("id,pk").unwrap();
/// assert_eq!(tag.name, "id");
/// assert!(tag.primary_key);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub primary_key: bool,
    pub read_only: bool,
    pub foreign_key: bool,
    pub inline: bool,
}

impl Tag {
    /// Marks a field that must not be mapped.
    pub const EXCLUDED: &'static str = "-";

    pub fn parse(tag: &str) -> Result<Tag> {
        if tag.trim().is_empty() {
            return Err(PersistError::configuration("Empty annotation"));
        }
        let mut parts = tag.split(',').map(str::trim);
        let mut result = Tag {
            name: parts.next().unwrap_or_default().to_owned(),
            ..Default::default()
        };
        for flag in parts {
            match flag.to_ascii_lowercase().as_str() {
                "pk" => result.primary_key = true,
                "ro" => result.read_only = true,
                "fk" => result.foreign_key = true,
                "inline" => result.inline = true,
                _ => {
                    return Err(PersistError::configuration(format!(
                        "Unknown flag `{flag}` in annotation `{tag}`, expected one of: pk, ro, fk, inline"
                    )));
                }
            }
        }
        Ok(result)
    }

    pub fn is_excluded(&self) -> bool {
        self.name == Self::EXCLUDED
    }
}

#[cfg(test)]
mod tests {
    use super::Tag;
    use crate::is_configuration;

    #[test]
    fn flags() {
        let tag = Tag::parse("created_at, ro").unwrap();
        assert_eq!(tag.name, "created_at");
        assert!(tag.read_only);
        assert!(!tag.primary_key);

        let tag = Tag::parse("owner_id,FK").unwrap();
        assert!(tag.foreign_key);

        let tag = Tag::parse("prefix_,inline").unwrap();
        assert_eq!(tag.name, "prefix_");
        assert!(tag.inline);

        let tag = Tag::parse(",inline").unwrap();
        assert_eq!(tag.name, "");
        assert!(tag.inline);
    }

    #[test]
    fn excluded() {
        assert!(Tag::parse("-").unwrap().is_excluded());
        assert!(!Tag::parse("a").unwrap().is_excluded());
    }

    #[test]
    fn invalid() {
        assert!(is_configuration(&Tag::parse("").unwrap_err()));
        assert!(is_configuration(&Tag::parse("  ").unwrap_err()));
        let error = Tag::parse("id,primary").unwrap_err();
        assert!(is_configuration(&error));
        assert!(error.to_string().contains("`primary`"));
    }
}
