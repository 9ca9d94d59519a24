//! Arena-backed tree of per-node rule settings.
//!
//! Every node stores two tables. `node_rules` holds overrides declared for
//! that exact node and is sparse. `subtree_rules` is total and holds the
//! fallback inherited by descendants that lack their own override.
//! An override written by a subtree declaration is marked as such, and a
//! later subtree declaration on an ancestor replaces it.
//! Children are addressed by key name, or by the decimal index for array
//! positions, and created on demand while rules are applied.

use std::collections::BTreeMap;

use json_match_config::{RuleKind, RuleSetting, RuleTable};

/// Stable handle to a node inside a [`ConfigTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
pub struct ConfigNode {
    name: Option<String>,
    node_rules: RuleTable<Option<RuleSetting>>,
    from_subtree: RuleTable<bool>,
    subtree_rules: RuleTable<RuleSetting>,
    children: BTreeMap<String, NodeId>,
}

impl ConfigNode {
    fn new(name: Option<String>, inherited: RuleTable<RuleSetting>) -> Self {
        ConfigNode {
            name,
            node_rules: RuleTable::default(),
            from_subtree: RuleTable::default(),
            subtree_rules: inherited,
            children: BTreeMap::new(),
        }
    }

    /// `None` for the top-level node.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn node_rule(&self, kind: RuleKind) -> Option<&RuleSetting> {
        self.node_rules[kind].as_ref()
    }

    pub fn subtree_rule(&self, kind: RuleKind) -> &RuleSetting {
        &self.subtree_rules[kind]
    }

    pub fn subtree_rules(&self) -> &RuleTable<RuleSetting> {
        &self.subtree_rules
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Position reached while walking a document against the tree.
///
/// Documents usually contain far more nodes than were configured. Once the
/// walk leaves the configured part of the tree it carries the last
/// configured node's subtree defaults, which no deeper override can change.
#[derive(Clone, Copy, Debug)]
pub enum Cursor<'t> {
    Node(NodeId),
    Detached(&'t RuleTable<RuleSetting>),
}

#[derive(Clone, Debug)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
}

impl ConfigTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Create a tree whose top-level node carries `defaults` as its subtree rules.
    pub fn new(defaults: RuleTable<RuleSetting>) -> Self {
        ConfigTree {
            nodes: vec![ConfigNode::new(None, defaults)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id).children.get(name).copied()
    }

    /// Follow `names` from `id`, returning `None` if any step is missing.
    pub fn descendant(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        names
            .iter()
            .try_fold(id, |current, name| self.child(current, name))
    }

    /// Find the named child, creating it seeded with this node's subtree rules.
    pub fn child_or_insert(&mut self, id: NodeId, name: &str) -> NodeId {
        if let Some(existing) = self.child(id, name) {
            return existing;
        }
        let inherited = self.nodes[id.0].subtree_rules.clone();
        let child = NodeId(self.nodes.len());
        self.nodes.push(ConfigNode::new(Some(name.to_string()), inherited));
        self.nodes[id.0].children.insert(name.to_string(), child);
        child
    }

    /// Single-node override. It survives later subtree declarations above it.
    pub fn set_node_rule(&mut self, id: NodeId, kind: RuleKind, setting: RuleSetting) {
        let node = &mut self.nodes[id.0];
        node.node_rules.set(kind, Some(setting));
        node.from_subtree.set(kind, false);
    }

    /// Subtree declaration: `id` takes `setting` as its own override and as
    /// the default for everything below it.
    pub fn declare_subtree_rule(&mut self, id: NodeId, kind: RuleKind, setting: RuleSetting) {
        self.set_subtree_rule(id, kind, setting.clone());
        let node = &mut self.nodes[id.0];
        node.node_rules.set(kind, Some(setting));
        node.from_subtree.set(kind, true);
    }

    /// Set the subtree default for `kind` on `id` and every existing
    /// descendant. Other kinds' defaults are left untouched. Descendant
    /// overrides left by earlier subtree declarations are replaced too.
    pub fn set_subtree_rule(&mut self, id: NodeId, kind: RuleKind, setting: RuleSetting) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let node = &mut self.nodes[current.0];
            node.subtree_rules.set(kind, setting.clone());
            if current != id && node.from_subtree[kind] {
                node.node_rules.set(kind, Some(setting.clone()));
            }
            pending.extend(node.children.values().copied());
        }
    }

    /// Leave the configured tree, keeping the cursor's subtree defaults.
    pub fn detach<'t>(&'t self, cursor: Cursor<'t>) -> Cursor<'t> {
        match cursor {
            Cursor::Node(id) => Cursor::Detached(&self.node(id).subtree_rules),
            detached => detached,
        }
    }

    pub fn root(&self) -> Cursor<'_> {
        Cursor::Node(Self::ROOT)
    }

    /// Effective setting at the cursor: its own override, else its subtree default.
    pub fn local<'t>(&'t self, cursor: Cursor<'t>, kind: RuleKind) -> &'t RuleSetting {
        match cursor {
            Cursor::Node(id) => {
                let node = self.node(id);
                node.node_rules[kind]
                    .as_ref()
                    .unwrap_or(&node.subtree_rules[kind])
            }
            Cursor::Detached(table) => &table[kind],
        }
    }

    /// Move to the child called `name`, detaching when it was never configured.
    pub fn descend<'t>(&'t self, cursor: Cursor<'t>, name: &str) -> Cursor<'t> {
        match cursor {
            Cursor::Node(id) => match self.child(id, name) {
                Some(child) => Cursor::Node(child),
                None => Cursor::Detached(&self.node(id).subtree_rules),
            },
            detached => detached,
        }
    }

    /// Effective setting for element `index` of the array at `list`.
    ///
    /// Precedence: the element's own override, the array's own override, the
    /// element's subtree default, the array's subtree default. This lets a
    /// rule declared once on an array reach every element.
    pub fn element<'t>(
        &'t self,
        list: Cursor<'t>,
        index: usize,
        kind: RuleKind,
    ) -> &'t RuleSetting {
        let parent = match list {
            Cursor::Node(id) => self.node(id),
            Cursor::Detached(table) => return &table[kind],
        };
        let child = self.child_by_index(list, index).map(|id| self.node(id));

        child
            .and_then(|node| node.node_rules[kind].as_ref())
            .or(parent.node_rules[kind].as_ref())
            .or(child.map(|node| &node.subtree_rules[kind]))
            .unwrap_or(&parent.subtree_rules[kind])
    }

    fn child_by_index(&self, list: Cursor<'_>, index: usize) -> Option<NodeId> {
        match list {
            Cursor::Node(id) => self.child(id, &index.to_string()),
            Cursor::Detached(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_match_config::MatchMode;

    fn on() -> RuleSetting {
        RuleSetting::new(true)
    }

    #[test]
    fn new_children_inherit_subtree_defaults() {
        let mut tree = ConfigTree::new(MatchMode::Exact.defaults());
        let a = tree.child_or_insert(ConfigTree::ROOT, "a");
        assert!(tree.node(a).subtree_rule(RuleKind::PrimitiveExactMatch).active);
        assert_eq!(tree.child_or_insert(ConfigTree::ROOT, "a"), a);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn subtree_propagation_touches_only_one_kind() {
        let mut tree = ConfigTree::new(MatchMode::Type.defaults());
        let a = tree.child_or_insert(ConfigTree::ROOT, "a");
        let b = tree.child_or_insert(a, "b");
        tree.set_subtree_rule(b, RuleKind::CollectionEqualCount, on());

        tree.set_subtree_rule(a, RuleKind::WildcardMatch, on());

        assert!(tree.node(b).subtree_rule(RuleKind::WildcardMatch).active);
        assert!(tree.node(b).subtree_rule(RuleKind::CollectionEqualCount).active);
        assert!(!tree.node(a).subtree_rule(RuleKind::CollectionEqualCount).active);
    }

    #[test]
    fn detached_cursor_keeps_last_subtree_defaults() {
        let mut tree = ConfigTree::new(MatchMode::Type.defaults());
        let a = tree.child_or_insert(ConfigTree::ROOT, "a");
        tree.set_subtree_rule(a, RuleKind::CollectionEqualCount, on());
        tree.set_node_rule(a, RuleKind::WildcardMatch, on());

        let below = tree.descend(tree.descend(tree.root(), "a"), "unknown");
        let deeper = tree.descend(below, "further");
        assert!(tree.local(deeper, RuleKind::CollectionEqualCount).active);
        assert!(!tree.local(deeper, RuleKind::WildcardMatch).active);
    }

    #[test]
    fn element_precedence_prefers_overrides_over_defaults() {
        let mut tree = ConfigTree::new(MatchMode::Exact.defaults());
        let list = tree.child_or_insert(ConfigTree::ROOT, "list");
        let first = tree.child_or_insert(list, "0");
        tree.set_node_rule(list, RuleKind::PrimitiveExactMatch, RuleSetting::new(false));
        tree.set_subtree_rule(first, RuleKind::WildcardMatch, on());

        let cursor = Cursor::Node(list);
        // Array override beats the element's inherited default.
        assert!(!tree.element(cursor, 0, RuleKind::PrimitiveExactMatch).active);
        assert!(!tree.element(cursor, 5, RuleKind::PrimitiveExactMatch).active);

        // Element override beats the array override.
        tree.set_node_rule(first, RuleKind::PrimitiveExactMatch, on());
        assert!(tree.element(cursor, 0, RuleKind::PrimitiveExactMatch).active);

        // Element subtree default beats the array subtree default.
        assert!(tree.element(cursor, 0, RuleKind::WildcardMatch).active);
        assert!(!tree.element(cursor, 1, RuleKind::WildcardMatch).active);
    }

    #[test]
    fn ancestor_subtree_declaration_replaces_earlier_subtree_overrides() {
        let mut tree = ConfigTree::new(MatchMode::Type.defaults());
        let list = tree.child_or_insert(ConfigTree::ROOT, "list");
        let pinned = tree.child_or_insert(ConfigTree::ROOT, "pinned");
        let off = RuleSetting::new(false);
        tree.declare_subtree_rule(list, RuleKind::PrimitiveExactMatch, off.clone());
        tree.set_node_rule(pinned, RuleKind::PrimitiveExactMatch, off);

        tree.declare_subtree_rule(ConfigTree::ROOT, RuleKind::PrimitiveExactMatch, on());

        assert!(tree.local(Cursor::Node(list), RuleKind::PrimitiveExactMatch).active);
        assert!(tree.element(Cursor::Node(list), 0, RuleKind::PrimitiveExactMatch).active);
        assert!(!tree.local(Cursor::Node(pinned), RuleKind::PrimitiveExactMatch).active);
        assert!(tree.node(pinned).subtree_rule(RuleKind::PrimitiveExactMatch).active);
    }

    #[test]
    fn detach_keeps_the_node_subtree_table() {
        let mut tree = ConfigTree::new(MatchMode::Type.defaults());
        let list = tree.child_or_insert(ConfigTree::ROOT, "list");
        tree.set_node_rule(list, RuleKind::KeyMustBeAbsent, on());
        tree.set_subtree_rule(list, RuleKind::CollectionEqualCount, on());

        let detached = tree.detach(Cursor::Node(list));
        assert!(!tree.local(detached, RuleKind::KeyMustBeAbsent).active);
        assert!(tree.local(detached, RuleKind::CollectionEqualCount).active);
    }
}
