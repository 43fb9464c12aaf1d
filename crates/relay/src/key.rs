use {
    postrelay_channels::{FeedId, GroupId},
    std::fmt,
};

/// Owner of one in-flight media group: the source feed plus the group id the
/// platform assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    source: FeedId,
    group: GroupId,
}

impl GroupKey {
    pub fn new(source: FeedId, group: GroupId) -> Self {
        Self { source, group }
    }

    pub fn source(&self) -> FeedId {
        self.source
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.group)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashSet};

    #[test]
    fn same_group_in_different_sources_is_distinct() {
        let a = GroupKey::new(FeedId(-1), GroupId::new("g"));
        let b = GroupKey::new(FeedId(-2), GroupId::new("g"));
        let a_again = GroupKey::new(FeedId(-1), GroupId::new("g"));

        let keys: HashSet<_> = [a.clone(), b, a_again].into_iter().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&a));
    }

    #[test]
    fn display_joins_source_and_group() {
        let key = GroupKey::new(FeedId(-100), GroupId::new("13579"));
        assert_eq!(key.to_string(), "-100/13579");
    }
}
