use deployview_core::{ResourceKind, ResourceRecord};
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = ResourceKind> {
    prop_oneof![
        Just(ResourceKind::Pod),
        Just(ResourceKind::Deployment),
        Just(ResourceKind::ReplicaSet),
        Just(ResourceKind::StatefulSet),
        Just(ResourceKind::Secret),
        Just(ResourceKind::ConfigMap),
        Just(ResourceKind::PersistentVolume),
        Just(ResourceKind::MongoDB),
    ]
}

/// Random acyclic snapshot in shuffled order.
///
/// Record `i` may only be owned by, or depend on, records `j < i`, so the
/// relations can never close a loop whatever order they arrive in.
pub(crate) fn snapshot_strategy() -> impl Strategy<Value = Vec<ResourceRecord>> {
    (1usize..24)
        .prop_flat_map(|count| {
            (0..count)
                .map(|i| {
                    let upper = i.max(1);
                    (
                        kind_strategy(),
                        proptest::option::weighted(0.6, 0..upper),
                        proptest::collection::vec(0..upper, 0..3),
                    )
                })
                .collect::<Vec<_>>()
        })
        .prop_map(|specs| {
            let kinds: Vec<ResourceKind> = specs.iter().map(|(kind, _, _)| kind.clone()).collect();
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (kind, owner, mut dependencies))| {
                    let mut record = ResourceRecord::new(format!("r{i}"), kind);
                    if let Some(owner) = owner.filter(|&o| o < i) {
                        record = record.owned_by(format!("r{owner}"), kinds[owner].clone());
                    }
                    dependencies.sort_unstable();
                    dependencies.dedup();
                    for dependency in dependencies.into_iter().filter(|&d| d < i) {
                        record = record.depends_on(format!("r{dependency}"));
                    }
                    record
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}
