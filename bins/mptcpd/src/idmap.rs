//! ID manager (§4.3): bijection between endpoints and 8-bit address IDs.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::endpoint::{self, EndpointKey};
use crate::error::{Error, Result};

/// Address ID space is `[1, 255]`; `0` is reserved "invalid" and never
/// allocated.
const MIN_ID: u8 = 1;
const MAX_ID: u8 = 255;

#[derive(Debug)]
pub struct IdMap {
    endpoint_to_id: HashMap<EndpointKey, u8>,
    used: [bool; 256],
    seed: u32,
}

impl Default for IdMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IdMap {
    pub fn new() -> Self {
        Self {
            endpoint_to_id: HashMap::new(),
            used: [false; 256],
            seed: endpoint::new_seed(),
        }
    }

    fn key(&self, endpoint: &SocketAddr) -> Result<EndpointKey> {
        EndpointKey::new(endpoint, self.seed)
    }

    /// Returns the endpoint's ID, allocating the smallest unused ID in
    /// `[1, 255]` on first use. Idempotent until `remove_id`.
    pub fn get_id(&mut self, endpoint: &SocketAddr) -> Result<u8> {
        let key = self.key(endpoint)?;
        if let Some(&id) = self.endpoint_to_id.get(&key) {
            return Ok(id);
        }

        let id = (MIN_ID..=MAX_ID)
            .find(|&id| !self.used[id as usize])
            .ok_or(Error::Exhausted)?;

        self.used[id as usize] = true;
        self.endpoint_to_id.insert(key, id);
        Ok(id)
    }

    /// Forces the mapping, replacing any prior mapping for the endpoint
    /// and marking `id` used. Idempotent on identical inputs.
    pub fn map_id(&mut self, endpoint: &SocketAddr, id: u8) -> Result<()> {
        if id == 0 {
            return Err(Error::InvalidId);
        }
        let key = self.key(endpoint)?;

        if let Some(&old) = self.endpoint_to_id.get(&key)
            && old != id
            && !self.endpoint_to_id.values().any(|&v| v == old)
        {
            self.used[old as usize] = false;
        }

        self.used[id as usize] = true;
        self.endpoint_to_id.insert(key, id);
        Ok(())
    }

    /// Removes and releases the endpoint's ID, returning it if present.
    pub fn remove_id(&mut self, endpoint: &SocketAddr) -> Option<u8> {
        let key = self.key(endpoint).ok()?;
        let id = self.endpoint_to_id.remove(&key)?;
        self.used[id as usize] = false;
        Some(id)
    }

    /// Number of endpoints currently mapped.
    pub fn len(&self) -> usize {
        self.endpoint_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn s1_id_assignment() {
        let mut map = IdMap::new();
        let a = ep("192.0.2.5:0");

        assert_eq!(map.get_id(&a).unwrap(), 1);
        assert_eq!(map.get_id(&a).unwrap(), 1);
        assert_eq!(map.remove_id(&a), Some(1));
        assert_eq!(map.get_id(&a).unwrap(), 1);
    }

    #[test]
    fn ids_are_unique_across_endpoints() {
        let mut map = IdMap::new();
        let a = ep("10.0.0.1:0");
        let b = ep("10.0.0.2:0");

        let id_a = map.get_id(&a).unwrap();
        let id_b = map.get_id(&b).unwrap();
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn exhaustion_returns_err() {
        let mut map = IdMap::new();
        for i in 0..255u32 {
            let addr: SocketAddr = format!("10.0.{}.{}:0", i / 256, i % 256).parse().unwrap();
            map.get_id(&addr).unwrap();
        }
        let overflow = ep("10.255.255.255:0");
        assert!(matches!(map.get_id(&overflow), Err(Error::Exhausted)));
    }

    #[test]
    fn map_id_is_idempotent_on_identical_inputs() {
        let mut map = IdMap::new();
        let a = ep("10.0.0.1:0");
        map.map_id(&a, 5).unwrap();
        map.map_id(&a, 5).unwrap();
        assert_eq!(map.get_id(&a).unwrap(), 5);
    }

    #[test]
    fn map_id_replaces_prior_mapping() {
        let mut map = IdMap::new();
        let a = ep("10.0.0.1:0");
        map.map_id(&a, 5).unwrap();
        map.map_id(&a, 9).unwrap();
        assert_eq!(map.get_id(&a).unwrap(), 9);
    }

    #[test]
    fn remove_absent_returns_none() {
        let mut map = IdMap::new();
        assert_eq!(map.remove_id(&ep("10.0.0.1:0")), None);
    }
}
