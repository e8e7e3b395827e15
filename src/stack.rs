//! Ordered, id-keyed effect stacks shared by players and channels.

use crate::effects::Effect;

/// Effects in apply order, each under a caller-chosen id.
///
/// Inserting under an id that is already present replaces that entry in
/// place, keeping its position in the apply order.
#[derive(Debug, Clone, Default)]
pub(crate) struct EffectStack {
    entries: Vec<(String, Effect)>,
}

impl EffectStack {
    /// Adds or replaces `id`, returning the replaced effect.
    pub(crate) fn insert(&mut self, id: String, mut effect: Effect) -> Option<Effect> {
        if effect.take_source().is_some() {
            log::warn!("effect {id:?}: dropped its source, stacks drive effects directly");
        }

        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => {
                log::debug!("effect {id:?}: replaced {} with {}", slot.name(), effect.name());
                Some(std::mem::replace(slot, effect))
            }
            None => {
                self.entries.push((id, effect));
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Effect> {
        let index = self.entries.iter().position(|(existing, _)| existing == id)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Effect> {
        self.entries.iter().find(|(existing, _)| existing == id).map(|(_, e)| e)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Effect> {
        self.entries.iter_mut().find(|(existing, _)| existing == id).map(|(_, e)| e)
    }

    pub(crate) fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Effect)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Runs every effect over `chunk` in apply order.
    pub(crate) fn apply(&mut self, chunk: &mut [u8]) {
        for (_, effect) in &mut self.entries {
            effect.apply(chunk);
        }
    }

    pub(crate) fn reset(&mut self) {
        for (_, effect) in &mut self.entries {
            effect.reset();
        }
    }
}
