//! Dashboard instances kept in thread-local storage, keyed by id

use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

use govmap_integration::DashboardSession;

pub struct DashboardInstance {
    pub session: DashboardSession,
}

thread_local! {
    static DASHBOARD_INSTANCES: RefCell<HashMap<Uuid, DashboardInstance>> =
        RefCell::new(HashMap::new());
}

pub struct InstanceManager;

impl InstanceManager {
    pub fn create_instance(session: DashboardSession) -> Uuid {
        let id = Uuid::new_v4();
        DASHBOARD_INSTANCES.with(|instances| {
            instances
                .borrow_mut()
                .insert(id, DashboardInstance { session });
        });
        id
    }

    pub fn with_instance<F, R>(id: &Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&DashboardInstance) -> R,
    {
        DASHBOARD_INSTANCES.with(|instances| instances.borrow().get(id).map(f))
    }

    pub fn with_instance_mut<F, R>(id: &Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut DashboardInstance) -> R,
    {
        DASHBOARD_INSTANCES.with(|instances| instances.borrow_mut().get_mut(id).map(f))
    }

    pub fn instance_exists(id: &Uuid) -> bool {
        DASHBOARD_INSTANCES.with(|instances| instances.borrow().contains_key(id))
    }

    pub fn remove_instance(id: &Uuid) -> Option<DashboardInstance> {
        DASHBOARD_INSTANCES.with(|instances| instances.borrow_mut().remove(id))
    }

    pub fn instance_count() -> usize {
        DASHBOARD_INSTANCES.with(|instances| instances.borrow().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govmap_config::DashboardConfig;

    #[test]
    fn test_instance_lifecycle() {
        let session = DashboardSession::new(DashboardConfig::default()).unwrap();
        let id = InstanceManager::create_instance(session);

        assert!(InstanceManager::instance_exists(&id));
        assert_eq!(InstanceManager::instance_count(), 1);
        let chain = InstanceManager::with_instance(&id, |i| {
            i.session.selection().selected_chain.clone()
        });
        assert_eq!(chain, Some(None));

        assert!(InstanceManager::remove_instance(&id).is_some());
        assert!(!InstanceManager::instance_exists(&id));
        assert!(InstanceManager::with_instance_mut(&id, |_| ()).is_none());
    }
}
