//! Built-in activities for Stampede
//!
//! Each activity type is registered under a short type tag which plan
//! documents reference through `className`.

pub mod activities;

pub use activities::{
    BranchActivity, DelayActivity, FailActivity, LogActivity, RandomActivity, SetActivity,
};

use stampede_core::ActivityRegistry;

/// Registry holding every built-in activity type
pub fn builtin_registry() -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    register_builtins(&mut registry);
    registry
}

/// Add the built-in activity types to an existing registry
pub fn register_builtins(registry: &mut ActivityRegistry) {
    registry
        .register(activities::delay::TYPE_TAG, DelayActivity::create)
        .register(activities::set::TYPE_TAG, SetActivity::create)
        .register(activities::log::TYPE_TAG, LogActivity::create)
        .register(activities::random::TYPE_TAG, RandomActivity::create)
        .register(activities::branch::TYPE_TAG, BranchActivity::create)
        .register(activities::fail::TYPE_TAG, FailActivity::create);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_type_tags() {
        let registry = builtin_registry();
        assert_eq!(
            registry.type_tags(),
            vec!["branch", "delay", "fail", "log", "random", "set"]
        );
    }
}
