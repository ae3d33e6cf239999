//! Comment threading: group a review's flat comment list into reply trees.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::Comment;

/// A comment with its replies, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including this one.
    #[must_use]
    pub fn comment_count(&self) -> usize {
        1 + self.replies.iter().map(Self::comment_count).sum::<usize>()
    }
}

/// Build reply trees from a flat comment list.
///
/// Comments whose parent is not in `comments` are promoted to roots, as are
/// comments caught in a parent cycle. Every input comment appears exactly once.
#[must_use]
pub fn build_threads(comments: &[Comment]) -> Vec<CommentNode> {
    let mut ordered: Vec<&Comment> = comments.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let known: HashSet<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&Comment>> = HashMap::new();
    let mut roots: Vec<&Comment> = Vec::new();

    for c in &ordered {
        match c.parent_comment_id.as_deref() {
            Some(parent) if parent != c.id && known.contains(parent) => {
                children.entry(parent).or_default().push(c);
            }
            _ => roots.push(c),
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut threads: Vec<CommentNode> = roots
        .into_iter()
        .filter_map(|c| build_node(c, &children, &mut visited))
        .collect();

    // Anything unreached sits on a cycle.
    for c in &ordered {
        if let Some(node) = build_node(c, &children, &mut visited) {
            threads.push(node);
        }
    }
    threads
}

fn build_node<'a>(
    comment: &'a Comment,
    children: &HashMap<&str, Vec<&'a Comment>>,
    visited: &mut HashSet<&'a str>,
) -> Option<CommentNode> {
    if !visited.insert(comment.id.as_str()) {
        return None;
    }
    let replies = children
        .get(comment.id.as_str())
        .map(|kids| {
            kids.iter()
                .filter_map(|k| build_node(k, children, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(CommentNode {
        comment: comment.clone(),
        replies,
    })
}
