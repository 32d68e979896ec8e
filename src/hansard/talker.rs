/*!
 * Talker (speaker) records and their extraction from transcript markup.
 *
 * A talker block looks like:
 *
 * ```xml
 * <talker>
 *     <page.no>30</page.no>
 *     <time.stamp/>
 *     <name role="metadata">Wilson, Tim MP</name>
 *     <name.id>IMW</name.id>
 *     <electorate>Goldstein</electorate>
 *     <party>LP</party>
 * </talker>
 * ```
 */

use log::warn;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::markup;
use crate::errors::TalkerError;

/// A person attributable to speech parts.
///
/// Equality and hashing are structural over all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Talker {
    pub id: Option<String>,
    pub name: String,
    pub electorate: Option<String>,
    pub party: Option<String>,
}

impl Talker {
    /// Build a talker from fully populated fields
    pub fn new_validated(id: &str, name: &str, electorate: &str, party: &str) -> Result<Self, TalkerError> {
        for (field, value) in [("name.id", id), ("name", name), ("electorate", electorate), ("party", party)] {
            if value.trim().is_empty() {
                return Err(TalkerError::MissingField(field));
            }
        }
        Ok(Self {
            id: Some(id.trim().to_string()),
            name: name.trim().to_string(),
            electorate: Some(electorate.trim().to_string()),
            party: Some(party.trim().to_string()),
        })
    }

    /// Read a `talker` element, requiring every field to be present
    pub fn from_node(node: Node) -> Result<Self, TalkerError> {
        let id = markup::find_text(node, "name.id").ok_or(TalkerError::MissingField("name.id"))?;
        let name = markup::find_text(node, "name").ok_or(TalkerError::MissingField("name"))?;
        let electorate = markup::find_text(node, "electorate").ok_or(TalkerError::MissingField("electorate"))?;
        let party = markup::find_text(node, "party").ok_or(TalkerError::MissingField("party"))?;
        Self::new_validated(&id, &name, &electorate, &party)
    }
}

/// Talker id of a `talker` element, if it has one
pub fn talker_id(node: Node) -> Option<String> {
    markup::find_text(node, "name.id")
}

/// Every valid talker in the document, deduplicated, in order of first appearance
pub fn extract_talkers(document: &Document) -> Vec<Talker> {
    let mut seen = HashSet::new();
    let mut talkers = Vec::new();

    for node in markup::find_all(document.root(), "talker") {
        let talker = match Talker::from_node(node) {
            Ok(talker) => talker,
            Err(e) => {
                warn!("Skipping talker at byte {}: {}", node.range().start, e);
                continue;
            }
        };
        if seen.insert(talker.clone()) {
            talkers.push(talker);
        }
    }

    talkers
}

/// Talkers indexed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TalkerList {
    talkers: Vec<Talker>,
    by_id: HashMap<String, usize>,
}

impl TalkerList {
    pub fn new(talkers: Vec<Talker>) -> Self {
        let by_id = talkers
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.id.clone().map(|id| (id, i)))
            .collect();
        Self { talkers, by_id }
    }

    /// Look up a talker by id
    pub fn find(&self, talker_id: &str) -> Option<&Talker> {
        self.by_id.get(talker_id).map(|&i| &self.talkers[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Talker> {
        self.talkers.iter()
    }

    pub fn len(&self) -> usize {
        self.talkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talkers.is_empty()
    }
}
