//! Fault-tolerance cache of the next nodes clockwise.

use crate::common::Node;

/// Number of successors each node keeps.
pub const SUCCESSOR_LIST_SIZE: usize = 8;

#[derive(Debug, Clone, Default)]
/// The next [SUCCESSOR_LIST_SIZE] nodes clockwise, the first entry being the successor.
///
/// Empty until the node first joins a ring, always full afterwards.
pub struct SuccessorList {
    nodes: Vec<Node>,
}

impl SuccessorList {
    /// A full list of `node`, the shape of a singleton ring.
    pub fn filled(node: &Node) -> Self {
        SuccessorList {
            nodes: vec![node.clone(); SUCCESSOR_LIST_SIZE],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The immediate successor.
    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Replace the immediate successor, keeping the rest of the list.
    pub fn set_first(&mut self, node: Node) {
        match self.nodes.first_mut() {
            Some(first) => *first = node,
            None => self.nodes = vec![node; SUCCESSOR_LIST_SIZE],
        }
    }

    /// Rebuild the list from `successor` followed by its own successor list,
    /// shifted by one and padded with `local` if the remote list is short.
    pub fn refresh(&mut self, successor: Node, remote: &[Node], local: &Node) {
        let mut nodes = Vec::with_capacity(SUCCESSOR_LIST_SIZE);
        nodes.push(successor);
        nodes.extend(remote.iter().take(SUCCESSOR_LIST_SIZE - 1).cloned());
        nodes.resize(SUCCESSOR_LIST_SIZE, local.clone());

        self.nodes = nodes;
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::Id;

    fn node(id: u64) -> Node {
        Node::with_id("127.0.0.1", 7000 + id as u16, Id(id))
    }

    #[test]
    fn refresh_shifts_remote_list() {
        let local = node(10);
        let mut list = SuccessorList::filled(&local);

        let remote: Vec<Node> = (0..SUCCESSOR_LIST_SIZE as u64).map(|i| node(40 + i)).collect();

        list.refresh(node(30), &remote, &local);

        let ids: Vec<u64> = list.iter().map(|n| n.id().0).collect();
        assert_eq!(ids, vec![30, 40, 41, 42, 43, 44, 45, 46]);
    }

    #[test]
    fn refresh_pads_short_remote_list() {
        let local = node(10);
        let mut list = SuccessorList::default();

        list.refresh(node(30), &[node(50)], &local);

        assert_eq!(list.to_vec().len(), SUCCESSOR_LIST_SIZE);
        assert_eq!(list.first(), Some(&node(30)));
        assert_eq!(list.iter().nth(1), Some(&node(50)));
        assert!(list.iter().skip(2).all(|n| *n == local));
    }

    #[test]
    fn set_first_keeps_tail() {
        let mut list = SuccessorList::default();
        assert!(list.is_empty());

        list.set_first(node(30));
        assert_eq!(list.to_vec(), vec![node(30); SUCCESSOR_LIST_SIZE]);

        list.set_first(node(20));
        assert_eq!(list.first(), Some(&node(20)));
        assert_eq!(list.iter().nth(1), Some(&node(30)));
    }
}
