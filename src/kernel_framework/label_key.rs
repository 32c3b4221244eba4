use std::{collections::HashMap, fmt::Display};

use anyhow::{Result, anyhow};

use crate::kernel_framework::{infoable::Infoable, label::Label};

/// A bidirectional mapping between symbolic labels and dense indices.
///
/// The forward direction (label -> index) is a hash map; the reverse
/// direction (index -> label) is a vector, so indices always cover
/// 0..len without gaps. Both directions are kept consistent: a label
/// maps to exactly one index and vice versa.
#[derive(Clone, Debug)]
pub struct LabelKey<L: Label> {
    label2index: HashMap<L, usize>,
    index2label: Vec<L>,
}

impl<L: Label> LabelKey<L> {
    pub fn new() -> Self {
        Self {
            label2index: HashMap::new(),
            index2label: vec![],
        }
    }

    /// Build a key by enumerating the labels in iteration order.
    /// Duplicate labels are rejected.
    pub fn from_labels(labels: impl IntoIterator<Item = L>) -> Result<Self> {
        let mut result = Self::new();
        for label in labels {
            let index = result.index2label.len();
            if result.label2index.insert(label.clone(), index).is_some() {
                return Err(anyhow!("duplicate label {}", label));
            }
            result.index2label.push(label);
        }
        Ok(result)
    }

    /// Build a key from explicit label -> index pairs.
    /// Duplicate labels, duplicate indices, and index sets that do not
    /// cover 0..len are rejected.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (L, usize)>) -> Result<Self> {
        let pairs: Vec<(L, usize)> = pairs.into_iter().collect();
        let len = pairs.len();

        let mut label2index = HashMap::new();
        let mut index2label: Vec<Option<L>> = vec![None; len];
        for (label, index) in pairs {
            if index >= len {
                return Err(anyhow!(
                    "label {} has index {}, which is outside 0..{}",
                    label,
                    index,
                    len
                ));
            }
            if index2label[index].is_some() {
                return Err(anyhow!("duplicate index {}", index));
            }
            if label2index.insert(label.clone(), index).is_some() {
                return Err(anyhow!("duplicate label {}", label));
            }
            index2label[index] = Some(label);
        }

        Ok(Self {
            label2index,
            index2label: index2label.into_iter().flatten().collect(),
        })
    }

    /// Return the index of `label`, assigning the next free index if the
    /// label has not been seen before.
    pub fn insert(&mut self, label: L) -> usize {
        match self.label2index.get(&label) {
            Some(index) => *index,
            None => {
                let index = self.index2label.len();
                self.label2index.insert(label.clone(), index);
                self.index2label.push(label);
                index
            }
        }
    }

    pub fn index_of(&self, label: &L) -> Result<usize> {
        self.label2index
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown label {}", label))
    }

    pub fn label_of(&self, index: usize) -> Result<&L> {
        self.index2label
            .get(index)
            .ok_or_else(|| anyhow!("no label for index {}", index))
    }

    pub fn contains(&self, label: &L) -> bool {
        self.label2index.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.index2label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index2label.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.index2label.iter()
    }
}

impl<L: Label> Display for LabelKey<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, label) in self.index2label.iter().enumerate() {
            write!(f, "{}: {}, ", index, label)?;
        }
        write!(f, "")
    }
}

impl<L: Label> Infoable for LabelKey<L> {
    fn info(&self, f: &mut impl std::io::Write) -> Result<()> {
        Ok(writeln!(f, "Number of labels\t{}", self.len())?)
    }
}
