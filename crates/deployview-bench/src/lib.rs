use deployview_core::{ResourceKind, ResourceRecord};

/// Snapshot of `deployment_count` MongoDB replica sets plus the operator,
/// shaped like a busy namespace: every replica set has a stateful set, its
/// pods, a service and an agent secret the pods depend on.
pub fn generate_synthetic_deployment(
    deployment_count: usize,
    members: usize,
) -> Vec<ResourceRecord> {
    let mut resources = vec![
        ResourceRecord::new("crd-mongodb", ResourceKind::CustomResourceDefinition)
            .with_name("mongodb.mongodb.com"),
        ResourceRecord::new("operator", ResourceKind::Deployment)
            .with_name("mongodb-enterprise-operator"),
        ResourceRecord::new("operator-rs", ResourceKind::ReplicaSet)
            .with_name("mongodb-enterprise-operator-6c5")
            .owned_by("operator", ResourceKind::Deployment),
        ResourceRecord::new("operator-pod", ResourceKind::Pod)
            .with_name("mongodb-enterprise-operator-6c5-q8t")
            .owned_by("operator-rs", ResourceKind::ReplicaSet),
    ];

    for i in 0..deployment_count {
        let mdb = format!("mdb-{i}");
        let sts = format!("sts-{i}");
        let secret = format!("secret-{i}");

        resources.push(
            ResourceRecord::new(mdb.clone(), ResourceKind::MongoDB)
                .with_name(format!("replica-set-{i}"))
                .depends_on("crd-mongodb"),
        );
        resources.push(
            ResourceRecord::new(sts.clone(), ResourceKind::StatefulSet)
                .owned_by(mdb.clone(), ResourceKind::MongoDB),
        );
        resources.push(
            ResourceRecord::new(format!("svc-{i}"), ResourceKind::Service)
                .owned_by(mdb.clone(), ResourceKind::MongoDB),
        );
        resources.push(ResourceRecord::new(secret.clone(), ResourceKind::Secret));
        resources.push(
            ResourceRecord::new(format!("user-{i}"), ResourceKind::MongoDBUser)
                .depends_on(mdb.clone())
                .depends_on(secret.clone()),
        );

        for member in 0..members {
            resources.push(
                ResourceRecord::new(format!("pod-{i}-{member}"), ResourceKind::Pod)
                    .with_name(format!("replica-set-{i}-{member}"))
                    .owned_by(sts.clone(), ResourceKind::StatefulSet)
                    .depends_on(secret.clone()),
            );
        }
    }

    resources
}

/// Same snapshot in the JSON wire format.
pub fn generate_snapshot_json(deployment_count: usize, members: usize) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&generate_synthetic_deployment(
        deployment_count,
        members,
    ))?)
}
