//! One-shot fetch of all flavors, indexed by both id and name.

use std::collections::HashMap;

use crate::error::BalancerError;
use crate::model::Flavor;
use crate::ports::CloudPort;

/// Indexed by `id` and `name`; id wins on collision.
pub struct FlavorCache {
    by_key: HashMap<String, Flavor>,
}

impl FlavorCache {
    /// Fetch all flavors once via the Cloud Port and index them.
    pub async fn load(cloud: &dyn CloudPort) -> Result<Self, BalancerError> {
        let flavors = cloud.list_flavors().await?;
        let mut by_key = HashMap::with_capacity(flavors.len() * 2);

        // Index by name first so a later id insert (preferred on collision) overwrites it.
        for flavor in &flavors {
            by_key.insert(flavor.name.clone(), flavor.clone());
        }
        for flavor in &flavors {
            by_key.insert(flavor.id.clone(), flavor.clone());
        }

        log::debug!("cached {} flavors", flavors.len());
        Ok(Self { by_key })
    }

    /// Look up a flavor by id or name.
    pub fn get(&self, id_or_name: &str) -> Option<&Flavor> {
        self.by_key.get(id_or_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockCloudClient;
    use std::collections::HashMap as Map;

    fn flavor(id: &str, name: &str) -> Flavor {
        Flavor {
            id: id.to_string(),
            name: name.to_string(),
            vcpus: 2,
            ram_mb: 4096,
            extra_specs: Map::new(),
        }
    }

    #[tokio::test]
    async fn indexes_by_id_and_name() {
        let cloud = MockCloudClient {
            flavors: vec![flavor("f1", "small")],
            ..Default::default()
        };
        let cache = FlavorCache::load(&cloud).await.unwrap();
        assert_eq!(cache.get("f1").unwrap().name, "small");
        assert_eq!(cache.get("small").unwrap().id, "f1");
        assert!(cache.get("missing").is_none());
    }

    #[tokio::test]
    async fn id_wins_on_name_collision() {
        // A flavor whose id collides with another flavor's name: the id-keyed entry must win.
        let cloud = MockCloudClient {
            flavors: vec![flavor("dup", "small"), flavor("f2", "dup")],
            ..Default::default()
        };
        let cache = FlavorCache::load(&cloud).await.unwrap();
        assert_eq!(cache.get("dup").unwrap().name, "small");
    }
}
