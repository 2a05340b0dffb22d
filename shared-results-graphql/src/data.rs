use itertools::Itertools;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tracing::debug;

pub type Pk = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Parent {0} does not exist")]
    ParentNotFound(Pk),
    #[error("Child {0} does not exist")]
    ChildNotFound(Pk),
    #[error("Child {0} cannot be its own sibling")]
    SelfRelation(Pk),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub pk: Pk,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub pk: Pk,
    pub name: String,
    pub parent: Option<Pk>,
    pub siblings: Vec<Pk>,
}

#[derive(Debug, Clone, Default)]
pub struct ParentRecord {
    pub pk: Option<Pk>,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChildRecord {
    pub pk: Option<Pk>,
    pub name: String,
    pub parent: Option<Pk>,
    pub siblings: Option<Vec<Pk>>,
}

struct Table<T> {
    rows: HashMap<Pk, T>,
    counter: Pk,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            counter: 0,
        }
    }
}

impl<T> Table<T> {
    /// The pk to write to: `pk` if it names an existing row, a freshly allocated one otherwise
    fn upsert_key(&mut self, pk: Option<Pk>) -> Pk {
        match pk {
            Some(pk) if self.rows.contains_key(&pk) => pk,
            _ => {
                self.counter += 1;
                self.counter
            }
        }
    }
}

/// In-memory parent/child store shared by every request of a schema
#[derive(Clone, Default)]
pub struct Data {
    parents: Arc<RwLock<Table<Parent>>>,
    children: Arc<RwLock<Table<Child>>>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_parent(&self, record: ParentRecord) -> Parent {
        let mut parents = self.parents.write();
        let pk = parents.upsert_key(record.pk);
        let parent = Parent {
            pk,
            name: record.name,
        };
        parents.rows.insert(pk, parent.clone());
        debug!(pk, "parent upserted");
        parent
    }

    /// Create or update a child.
    ///
    /// `siblings`, when given, replaces the child's siblings, and the other side of every added or
    /// dropped relation is updated so that siblings stay symmetric.
    pub fn upsert_child(&self, record: ChildRecord) -> Result<Child, StoreError> {
        if let Some(parent) = record.parent {
            self.parent(parent).ok_or(StoreError::ParentNotFound(parent))?;
        }
        let mut children = self.children.write();
        let siblings = record
            .siblings
            .map(|siblings| siblings.into_iter().unique().collect_vec());
        if let Some(siblings) = &siblings {
            if let Some(missing) = siblings.iter().find(|pk| !children.rows.contains_key(*pk)) {
                return Err(StoreError::ChildNotFound(*missing));
            }
            if let Some(pk) = record.pk.filter(|pk| siblings.contains(pk)) {
                return Err(StoreError::SelfRelation(pk));
            }
        }
        let pk = children.upsert_key(record.pk);
        let previous = children
            .rows
            .get(&pk)
            .map(|child| child.siblings.clone())
            .unwrap_or_default();
        let siblings = siblings.unwrap_or_else(|| previous.clone());
        for other in previous.iter().filter(|other| !siblings.contains(*other)) {
            if let Some(row) = children.rows.get_mut(other) {
                row.siblings.retain(|sibling| *sibling != pk);
            }
        }
        for other in &siblings {
            if let Some(row) = children.rows.get_mut(other) {
                if !row.siblings.contains(&pk) {
                    row.siblings.push(pk);
                }
            }
        }
        let child = Child {
            pk,
            name: record.name,
            parent: record.parent,
            siblings,
        };
        children.rows.insert(pk, child.clone());
        debug!(pk, "child upserted");
        Ok(child)
    }

    pub fn parent(&self, pk: Pk) -> Option<Parent> {
        self.parents.read().rows.get(&pk).cloned()
    }

    pub fn child(&self, pk: Pk) -> Option<Child> {
        self.children.read().rows.get(&pk).cloned()
    }

    pub fn parents(&self) -> Vec<Parent> {
        let mut parents: Vec<_> = self.parents.read().rows.values().cloned().collect();
        parents.sort_by_key(|parent| parent.pk);
        parents
    }

    pub fn children(&self) -> Vec<Child> {
        let mut children: Vec<_> = self.children.read().rows.values().cloned().collect();
        children.sort_by_key(|child| child.pk);
        children
    }

    pub fn set_parent(&self, child: Pk, parent: Pk) -> Result<Child, StoreError> {
        self.parent(parent).ok_or(StoreError::ParentNotFound(parent))?;
        let mut children = self.children.write();
        let row = children
            .rows
            .get_mut(&child)
            .ok_or(StoreError::ChildNotFound(child))?;
        row.parent = Some(parent);
        debug!(child, parent, "parent set");
        Ok(row.clone())
    }

    /// Record `a` and `b` as siblings of each other
    pub fn add_sibling(&self, a: Pk, b: Pk) -> Result<(), StoreError> {
        if a == b {
            return Err(StoreError::SelfRelation(a));
        }
        let mut children = self.children.write();
        for pk in [a, b] {
            if !children.rows.contains_key(&pk) {
                return Err(StoreError::ChildNotFound(pk));
            }
        }
        for (pk, other) in [(a, b), (b, a)] {
            if let Some(row) = children.rows.get_mut(&pk) {
                if !row.siblings.contains(&other) {
                    row.siblings.push(other);
                }
            }
        }
        debug!(a, b, "siblings added");
        Ok(())
    }
}

#[cfg(test)]
mod data_tests {
    use super::{ChildRecord, Data, ParentRecord, StoreError};

    fn child(name: &str) -> ChildRecord {
        ChildRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_allocates_then_updates() {
        let data = Data::new();
        let created = data.upsert_parent(ParentRecord {
            pk: None,
            name: "Emilie".to_string(),
        });
        assert_eq!(created.pk, 1);
        let updated = data.upsert_parent(ParentRecord {
            pk: Some(created.pk),
            name: "Emily".to_string(),
        });
        assert_eq!(updated.pk, 1);
        assert_eq!(data.parents(), vec![updated]);
    }

    #[test]
    fn unknown_pk_creates_a_new_row() {
        let data = Data::new();
        let created = data
            .upsert_child(ChildRecord {
                pk: Some(99),
                ..child("John")
            })
            .unwrap();
        assert_eq!(created.pk, 1);
    }

    #[test]
    fn child_with_unknown_references_is_rejected() {
        let data = Data::new();
        let err = data
            .upsert_child(ChildRecord {
                parent: Some(7),
                ..child("John")
            })
            .unwrap_err();
        assert_eq!(err, StoreError::ParentNotFound(7));
        let err = data
            .upsert_child(ChildRecord {
                siblings: Some(vec![3]),
                ..child("John")
            })
            .unwrap_err();
        assert_eq!(err, StoreError::ChildNotFound(3));
        assert!(data.children().is_empty());
    }

    #[test]
    fn siblings_are_symmetric_and_deduplicated() {
        let data = Data::new();
        let john = data.upsert_child(child("John")).unwrap();
        let julie = data.upsert_child(child("Julie")).unwrap();
        data.add_sibling(john.pk, julie.pk).unwrap();
        data.add_sibling(julie.pk, john.pk).unwrap();
        assert_eq!(data.child(john.pk).unwrap().siblings, vec![julie.pk]);
        assert_eq!(data.child(julie.pk).unwrap().siblings, vec![john.pk]);
        assert_eq!(
            data.add_sibling(john.pk, john.pk),
            Err(StoreError::SelfRelation(john.pk))
        );
    }

    #[test]
    fn upsert_keeps_siblings_symmetric() {
        let data = Data::new();
        let john = data.upsert_child(child("John")).unwrap();
        let julie = data.upsert_child(child("Julie")).unwrap();
        let jack = data
            .upsert_child(ChildRecord {
                siblings: Some(vec![john.pk, john.pk]),
                ..child("Jack")
            })
            .unwrap();
        assert_eq!(jack.siblings, vec![john.pk]);
        assert_eq!(data.child(john.pk).unwrap().siblings, vec![jack.pk]);

        let jack = data
            .upsert_child(ChildRecord {
                pk: Some(jack.pk),
                siblings: Some(vec![julie.pk]),
                ..child("Jack")
            })
            .unwrap();
        assert_eq!(jack.siblings, vec![julie.pk]);
        assert!(data.child(john.pk).unwrap().siblings.is_empty());
        assert_eq!(data.child(julie.pk).unwrap().siblings, vec![jack.pk]);

        let renamed = data
            .upsert_child(ChildRecord {
                pk: Some(jack.pk),
                ..child("Jacques")
            })
            .unwrap();
        assert_eq!(renamed.siblings, vec![julie.pk]);
        assert_eq!(
            data.upsert_child(ChildRecord {
                pk: Some(julie.pk),
                siblings: Some(vec![julie.pk]),
                ..child("Julie")
            }),
            Err(StoreError::SelfRelation(julie.pk))
        );
    }

    #[test]
    fn set_parent_requires_both_rows() {
        let data = Data::new();
        let john = data.upsert_child(child("John")).unwrap();
        assert_eq!(
            data.set_parent(john.pk, 1),
            Err(StoreError::ParentNotFound(1))
        );
        let parent = data.upsert_parent(ParentRecord {
            pk: None,
            name: "Emilie".to_string(),
        });
        assert_eq!(
            data.set_parent(john.pk, parent.pk).unwrap().parent,
            Some(parent.pk)
        );
    }
}
