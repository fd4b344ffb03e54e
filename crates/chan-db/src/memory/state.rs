//! Versioned in-memory tables

use std::collections::{BTreeSet, HashMap};

use chan_core::entities::Channel;
use chan_core::value_objects::Snowflake;

#[derive(Debug, Clone)]
pub(super) struct Row {
    pub channel: Channel,
    /// Commit that last wrote the row; 0 for rows only present in an open view
    pub version: u64,
}

/// Children of one parent, any status or type
#[derive(Debug, Clone, Default)]
pub(super) struct ChildSet {
    pub ids: BTreeSet<Snowflake>,
    /// Commit that last changed a member row or the membership of the set
    pub version: u64,
}

#[derive(Debug, Clone, Default)]
pub(super) struct State {
    /// Last commit stamp handed out
    pub version: u64,
    pub rows: HashMap<Snowflake, Row>,
    pub children: HashMap<Option<Snowflake>, ChildSet>,
    pub members: HashMap<Snowflake, BTreeSet<Snowflake>>,
    /// (user, channel)
    pub subscriptions: BTreeSet<(Snowflake, Snowflake)>,
    /// Commit that last created a DM channel
    pub dm_version: u64,
    pub messages: HashMap<Snowflake, Snowflake>,
}

impl State {
    pub fn channel(&self, id: Snowflake) -> Option<&Channel> {
        self.rows.get(&id).map(|row| &row.channel)
    }

    pub fn active_channel(&self, id: Snowflake) -> Option<&Channel> {
        self.channel(id).filter(|c| c.is_active())
    }

    pub fn row_version(&self, id: Snowflake) -> u64 {
        self.rows.get(&id).map_or(0, |row| row.version)
    }

    pub fn child_set_version(&self, parent_id: Option<Snowflake>) -> u64 {
        self.children.get(&parent_id).map_or(0, |set| set.version)
    }

    pub fn children_of(&self, parent_id: Option<Snowflake>) -> impl Iterator<Item = &Channel> + '_ {
        self.children
            .get(&parent_id)
            .into_iter()
            .flat_map(|set| set.ids.iter())
            .filter_map(|id| self.channel(*id))
    }

    /// Whether an Active public sibling other than `exclude` uses `name`
    pub fn public_name_taken(
        &self,
        name: &str,
        parent_id: Option<Snowflake>,
        exclude: Option<Snowflake>,
    ) -> bool {
        self.children_of(parent_id).any(|c| {
            c.is_active()
                && c.is_public()
                && Some(c.id) != exclude
                && c.name.eq_ignore_ascii_case(name)
        })
    }

    pub fn members_of(&self, channel_id: Snowflake) -> impl Iterator<Item = Snowflake> + '_ {
        self.members
            .get(&channel_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Insert or overwrite a row, keeping the child index in step
    ///
    /// `stamp` is the commit version; `None` applies the write to an
    /// uncommitted view without touching any version.
    pub fn upsert(&mut self, channel: Channel, stamp: Option<u64>) {
        let id = channel.id;
        let new_parent = channel.parent_id;
        let previous = self.rows.get(&id).map(|row| (row.channel.parent_id, row.version));

        if let Some((old_parent, _)) = previous {
            if old_parent != new_parent {
                let set = self.children.entry(old_parent).or_default();
                set.ids.remove(&id);
                if let Some(stamp) = stamp {
                    set.version = stamp;
                }
            }
        }

        let set = self.children.entry(new_parent).or_default();
        set.ids.insert(id);
        if let Some(stamp) = stamp {
            set.version = stamp;
            if previous.is_none() && channel.is_dm() {
                self.dm_version = stamp;
            }
        }

        let version = stamp.unwrap_or_else(|| previous.map_or(0, |(_, version)| version));
        self.rows.insert(id, Row { channel, version });
    }

    pub fn add_members(&mut self, channel_id: Snowflake, user_ids: &[Snowflake]) {
        self.members
            .entry(channel_id)
            .or_default()
            .extend(user_ids.iter().copied());
    }
}
