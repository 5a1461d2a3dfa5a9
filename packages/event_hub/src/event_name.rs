use std::borrow::{Borrow, Cow};
use std::fmt::{self, Display, Formatter};

/// The name of an event, used to key listener registrations and to check the allow-list.
///
/// Typically event names are `&'static str` but for cases when the set of events is only known
/// at runtime, owned strings are also supported via `Cow`.
///
/// Any string converts into an `EventName`. Whether the name is acceptable (non-empty and, if the
/// hub has an allow-list, on that list) is decided by the hub when the name is used.
///
/// # Example
///
/// ```
/// use event_hub::EventName;
///
/// let fixed = EventName::from("connected");
/// let dynamic = EventName::from(format!("job_{}_done", 42));
///
/// assert_eq!(fixed.as_str(), "connected");
/// assert_eq!(dynamic.as_str(), "job_42_done");
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    /// Returns the name as a string slice.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty. An empty name is never a valid event name.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for EventName {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for EventName {
    #[inline]
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<Cow<'static, str>> for EventName {
    #[inline]
    fn from(value: Cow<'static, str>) -> Self {
        Self(value)
    }
}

impl From<&EventName> for EventName {
    #[inline]
    fn from(value: &EventName) -> Self {
        value.clone()
    }
}

// Allows `str` lookups in hash tables keyed by `EventName`. Hash and Eq of `Cow<str>` delegate
// to `str`, so the lookup is consistent with the key.
impl Borrow<str> for EventName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for EventName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use foldhash::{HashSet, HashSetExt};

    use super::*;

    #[test]
    fn borrowed_and_owned_names_are_equal() {
        assert_eq!(EventName::from("saved"), EventName::from("saved".to_string()));
    }

    #[test]
    fn lookup_by_str_finds_owned_name() {
        let mut names = HashSet::new();
        names.insert(EventName::from("saved".to_string()));

        assert!(names.contains("saved"));
        assert!(!names.contains("loaded"));
    }

    #[test]
    fn default_is_empty() {
        assert!(EventName::default().is_empty());
        assert!(!EventName::from("x").is_empty());
    }

    #[test]
    fn display_is_the_bare_name() {
        assert_eq!(EventName::from("job_done").to_string(), "job_done");
    }
}
