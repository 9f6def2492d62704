use std::collections::BTreeMap;

use super::error::StageError;
use super::platform::MediaElement;
use super::policy::MediaPolicy;
use super::preload::PreloadMonitor;
use super::visibility::StartingIntent;

pub type InstanceId = u32;

/// One managed media element plus its policy and runtime state.
#[derive(Debug)]
pub struct MediaInstance<E> {
    pub id: InstanceId,
    pub element: E,
    policy: MediaPolicy,
    /// Present while the element is (or was) preloading.
    pub preload: Option<PreloadMonitor>,
    pub starting_intent: StartingIntent,
    pub scroll_target_seconds: f64,
    /// Click toggling and end handling are live once this is set.
    pub ready: bool,
}

impl<E> MediaInstance<E> {
    pub fn policy(&self) -> &MediaPolicy {
        &self.policy
    }
}

#[derive(Debug)]
pub struct InstanceRegistry<E> {
    next_id: InstanceId,
    instances: BTreeMap<InstanceId, MediaInstance<E>>,
}

impl<E> Default for InstanceRegistry<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            instances: BTreeMap::new(),
        }
    }
}

impl<E: MediaElement> InstanceRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new instance. Ids are never reused within one registry.
    pub fn create(&mut self, element: E, policy: MediaPolicy) -> InstanceId {
        let id = self.next_id;
        self.next_id += 1;
        self.instances.insert(
            id,
            MediaInstance {
                id,
                element,
                policy,
                preload: None,
                starting_intent: StartingIntent::Unknown,
                scroll_target_seconds: 0.0,
                ready: false,
            },
        );
        id
    }

    pub fn get(&self, id: InstanceId) -> Result<&MediaInstance<E>, StageError> {
        let instance = self.instances.get(&id).ok_or(StageError::NotFound(id))?;
        if !instance.element.is_attached() {
            return Err(StageError::Detached(id));
        }
        Ok(instance)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut MediaInstance<E>, StageError> {
        let instance = self.instances.get_mut(&id).ok_or(StageError::NotFound(id))?;
        if !instance.element.is_attached() {
            return Err(StageError::Detached(id));
        }
        Ok(instance)
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<MediaInstance<E>> {
        self.instances.remove(&id)
    }

    #[cfg(test)]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Ids of every instance whose policy matches, in creation order.
    pub fn ids_where<P>(&self, predicate: P) -> Vec<InstanceId>
    where
        P: Fn(&MediaPolicy) -> bool,
    {
        self.instances
            .values()
            .filter(|instance| predicate(&instance.policy))
            .map(|instance| instance.id)
            .collect()
    }

    pub fn any<P>(&self, predicate: P) -> bool
    where
        P: Fn(&MediaPolicy) -> bool,
    {
        self.instances.values().any(|instance| predicate(&instance.policy))
    }

    /// Ids whose element has left the page but are still registered.
    pub fn detached_ids(&self) -> Vec<InstanceId> {
        self.instances
            .values()
            .filter(|instance| !instance.element.is_attached())
            .map(|instance| instance.id)
            .collect()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.instances.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::testing::FakeMedia;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let mut registry = InstanceRegistry::new();
        let ids: HashSet<_> = (0..16)
            .map(|_| registry.create(FakeMedia::new(), MediaPolicy::default()))
            .collect();
        assert_eq!(ids.len(), 16);
        assert_eq!(registry.len(), 16);
    }

    #[test]
    fn removed_ids_are_not_found_and_not_reused() {
        let mut registry = InstanceRegistry::new();
        let first = registry.create(FakeMedia::new(), MediaPolicy::default());
        assert!(registry.remove(first).is_some());

        assert!(matches!(registry.get(first), Err(StageError::NotFound(id)) if id == first));
        let second = registry.create(FakeMedia::new(), MediaPolicy::default());
        assert_ne!(first, second);
    }

    #[test]
    fn detached_elements_are_reported() {
        let mut registry = InstanceRegistry::new();
        let media = FakeMedia::new();
        let id = registry.create(media.clone(), MediaPolicy::default());
        media.detach();

        let err = registry.get_mut(id).unwrap_err();
        assert!(matches!(err, StageError::Detached(_)));
        assert!(err.is_missing());
        assert!(registry.contains(id));
        assert_eq!(registry.detached_ids(), vec![id]);
    }

    #[test]
    fn filters_by_policy() {
        let mut registry = InstanceRegistry::new();
        let scroll = MediaPolicy {
            bind_scroll: true,
            ..MediaPolicy::default()
        };
        registry.create(FakeMedia::new(), MediaPolicy::default());
        let bound = registry.create(FakeMedia::new(), scroll);

        assert_eq!(registry.ids_where(|p| p.bind_scroll), vec![bound]);
        assert!(registry.any(|p| p.bind_scroll));
        assert!(!registry.any(|p| p.preload));
    }
}
