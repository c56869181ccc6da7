//! Client-side inventory model.

use wire::InventoryCommand;

use crate::types::Item;

/// The local player's items, in server order.
///
/// A slot is the 1-based position among items that share an id; commands
/// without a slot address the first such item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Applies one decoded command. Commands naming a missing item are ignored.
    pub fn apply(&mut self, command: &InventoryCommand) {
        match command {
            InventoryCommand::Full { entries } => {
                let old = std::mem::take(&mut self.items);
                self.items = entries
                    .iter()
                    .map(|entry| Item {
                        id: entry.id,
                        name: old
                            .iter()
                            .find(|item| item.id == entry.id)
                            .map(|item| item.name.clone())
                            .unwrap_or_default(),
                        equipped: entry.equipped,
                    })
                    .collect();
            }
            InventoryCommand::Add {
                id,
                slot,
                name,
                equip,
            } => {
                let pos = self.insert_position(*id, *slot);
                self.items.insert(
                    pos,
                    Item {
                        id: *id,
                        name: name.clone(),
                        equipped: *equip,
                    },
                );
            }
            InventoryCommand::Delete { id, slot } => {
                if let Some(pos) = self.position(*id, *slot) {
                    self.items.remove(pos);
                }
            }
            InventoryCommand::Equip { id, slot } => self.set_equipped(*id, *slot, true),
            InventoryCommand::Unequip { id, slot } => self.set_equipped(*id, *slot, false),
            InventoryCommand::Rename { id, slot, name } => {
                if let Some(pos) = self.position(*id, *slot) {
                    self.items[pos].name.clone_from(name);
                }
            }
        }
    }

    fn set_equipped(&mut self, id: u16, slot: Option<u8>, equipped: bool) {
        if let Some(pos) = self.position(id, slot) {
            self.items[pos].equipped = equipped;
        }
    }

    /// Where an added item lands so it takes `slot` among items sharing `id`.
    /// Without a slot, or past the last such item, it goes after them.
    fn insert_position(&self, id: u16, slot: Option<u8>) -> usize {
        let same_id = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.id == id)
            .map(|(pos, _)| pos);
        if let Some(slot) = slot {
            let nth = usize::from(slot.max(1)) - 1;
            if let Some(pos) = same_id.clone().nth(nth) {
                return pos;
            }
        }
        same_id.last().map_or(self.items.len(), |pos| pos + 1)
    }

    fn position(&self, id: u16, slot: Option<u8>) -> Option<usize> {
        let nth = usize::from(slot.unwrap_or(1).max(1)) - 1;
        let found = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.id == id)
            .nth(nth)
            .map(|(pos, _)| pos);
        if found.is_none() {
            log::debug!("inventory command for missing item {id} (slot {slot:?})");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::InventoryEntry;

    fn add(id: u16, name: &str) -> InventoryCommand {
        InventoryCommand::Add {
            id,
            slot: None,
            name: name.to_string(),
            equip: false,
        }
    }

    #[test]
    fn add_equip_delete() {
        let mut inv = Inventory::new();
        inv.apply(&add(10, "torch"));
        inv.apply(&add(11, "rope"));
        inv.apply(&InventoryCommand::Equip { id: 11, slot: None });
        assert!(inv.items()[1].equipped);
        inv.apply(&InventoryCommand::Delete { id: 10, slot: None });
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.items()[0].name, "rope");
    }

    #[test]
    fn slot_selects_among_duplicates() {
        let mut inv = Inventory::new();
        inv.apply(&add(5, "coin"));
        inv.apply(&add(5, "coin"));
        inv.apply(&InventoryCommand::Rename {
            id: 5,
            slot: Some(2),
            name: "lucky coin".to_string(),
        });
        assert_eq!(inv.items()[0].name, "coin");
        assert_eq!(inv.items()[1].name, "lucky coin");
    }

    #[test]
    fn add_with_slot_takes_that_slot() {
        let mut inv = Inventory::new();
        inv.apply(&add(5, "copper"));
        inv.apply(&add(7, "rope"));
        inv.apply(&add(5, "silver"));
        inv.apply(&InventoryCommand::Add {
            id: 5,
            slot: Some(2),
            name: "gold".to_string(),
            equip: true,
        });
        let names: Vec<_> = inv.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["copper", "rope", "gold", "silver"]);
        assert!(inv.items()[2].equipped);

        inv.apply(&InventoryCommand::Add {
            id: 7,
            slot: Some(9),
            name: "net".to_string(),
            equip: false,
        });
        let names: Vec<_> = inv.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, ["copper", "rope", "net", "gold", "silver"]);
    }

    #[test]
    fn full_replace_keeps_known_names() {
        let mut inv = Inventory::new();
        inv.apply(&add(1, "sword"));
        inv.apply(&InventoryCommand::Full {
            entries: vec![
                InventoryEntry {
                    id: 1,
                    equipped: true,
                },
                InventoryEntry {
                    id: 2,
                    equipped: false,
                },
            ],
        });
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.items()[0].name, "sword");
        assert!(inv.items()[0].equipped);
        assert_eq!(inv.items()[1].name, "");
    }

    #[test]
    fn missing_item_is_ignored() {
        let mut inv = Inventory::new();
        inv.apply(&InventoryCommand::Unequip { id: 3, slot: Some(4) });
        assert!(inv.is_empty());
    }
}
