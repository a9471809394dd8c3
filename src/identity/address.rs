use crate::identity::ordinal::{parse_ordinal, IdentityError, Ordinal};

/// AddressScheme builds the stable network address the orchestrator's DNS gives each replica:
/// `<replica>.<service>.<namespace>.svc.<cluster domain>`.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressScheme {
    pub service_name: String,
    pub namespace: String,
    pub cluster_domain: String,
    pub port: u16,
}

impl AddressScheme {
    pub fn full_address(&self, replica_name: &str) -> String {
        format!(
            "{}.{}.{}.svc.{}",
            replica_name, self.service_name, self.namespace, self.cluster_domain
        )
    }

    pub fn full_address_with_port(&self, replica_name: &str) -> String {
        format!("{}:{}", self.full_address(replica_name), self.port)
    }

    pub fn resolve(&self, replica_name: &str) -> Result<ReplicaIdentity, IdentityError> {
        let ordinal = parse_ordinal(replica_name)?;

        Ok(ReplicaIdentity {
            name: replica_name.to_string(),
            ordinal,
            full_address: self.full_address(replica_name),
            full_address_with_port: self.full_address_with_port(replica_name),
        })
    }
}

/// ReplicaIdentity is everything a controller needs to know about the replica it sits next to.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicaIdentity {
    pub name: String,
    pub ordinal: Ordinal,
    pub full_address: String,
    pub full_address_with_port: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> AddressScheme {
        AddressScheme {
            service_name: "mongo".into(),
            namespace: "prod".into(),
            cluster_domain: "cluster.local".into(),
            port: 27017,
        }
    }

    #[test]
    fn resolves_identity() {
        let identity = scheme().resolve("mongo-2").unwrap();

        assert_eq!(identity.name, "mongo-2");
        assert_eq!(identity.ordinal, Ordinal::new(2));
        assert_eq!(identity.full_address, "mongo-2.mongo.prod.svc.cluster.local");
        assert_eq!(identity.full_address_with_port, "mongo-2.mongo.prod.svc.cluster.local:27017");
    }

    #[test]
    fn honors_custom_domain_and_port() {
        let scheme = AddressScheme {
            cluster_domain: "k8s.example.com".into(),
            port: 57017,
            ..scheme()
        };

        assert_eq!(
            scheme.full_address_with_port("mongo-0"),
            "mongo-0.mongo.prod.svc.k8s.example.com:57017"
        );
    }

    #[test]
    fn unparseable_name_fails_resolution() {
        assert!(scheme().resolve("mongo").is_err());
    }
}
