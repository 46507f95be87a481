use uuid::Uuid;

use super::report::EntityKind;

/// Outcome of resolving a positional fixture reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
	Absent,
	Resolved(Uuid),
	Unresolved(i64),
}

/// Fixture index to backend id, one slot per entry of a fixture list.
///
/// Slots are filled in step order as entities are created or found, and a
/// filled slot is never overwritten.
#[derive(Debug, Clone)]
pub struct RefTable {
	kind: EntityKind,
	slots: Vec<Option<Uuid>>,
}

impl RefTable {
	pub fn with_len(kind: EntityKind, len: usize) -> Self {
		Self {
			kind,
			slots: vec![None; len],
		}
	}

	pub fn kind(&self) -> EntityKind {
		self.kind
	}

	/// Returns false when the index is out of range or already bound.
	pub fn bind(&mut self, index: usize, id: Uuid) -> bool {
		match self.slots.get_mut(index) {
			Some(slot) if slot.is_none() => {
				*slot = Some(id);
				true
			}
			_ => false,
		}
	}

	pub fn get(&self, index: i64) -> Option<Uuid> {
		usize::try_from(index)
			.ok()
			.and_then(|i| self.slots.get(i).copied().flatten())
	}

	pub fn reference(&self, raw: Option<i64>) -> Reference {
		match raw {
			None => Reference::Absent,
			Some(index) => self
				.get(index)
				.map_or(Reference::Unresolved(index), Reference::Resolved),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn binds_once() {
		let mut table = RefTable::with_len(EntityKind::Menu, 2);
		let first = Uuid::new_v4();
		assert!(table.bind(0, first));
		assert!(!table.bind(0, Uuid::new_v4()));
		assert!(!table.bind(5, Uuid::new_v4()));
		assert_eq!(table.get(0), Some(first));
		assert_eq!(table.get(1), None);
	}

	#[test]
	fn classifies_references() {
		let mut table = RefTable::with_len(EntityKind::Category, 3);
		let id = Uuid::new_v4();
		table.bind(1, id);
		assert_eq!(table.reference(None), Reference::Absent);
		assert_eq!(table.reference(Some(1)), Reference::Resolved(id));
		assert_eq!(table.reference(Some(0)), Reference::Unresolved(0));
		assert_eq!(table.reference(Some(-1)), Reference::Unresolved(-1));
		assert_eq!(table.reference(Some(9)), Reference::Unresolved(9));
	}
}
