//! Order correlation.
//!
//! Orders are matched to a request by exact equality on the owning-certificate
//! annotation. Anything fuzzier risks deleting an unrelated, healthy order.

use crate::records::OrderRecord;

/// In-memory index over one cluster snapshot of orders.
pub struct OrderIndex {
    orders: Vec<OrderRecord>,
}

impl OrderIndex {
    #[must_use]
    pub fn new(orders: Vec<OrderRecord>) -> Self {
        Self { orders }
    }

    /// All orders whose owning-certificate annotation equals
    /// `certificate_name` exactly (case-sensitive), in listing order.
    ///
    /// Zero matches is a valid outcome (order already cleaned up or never
    /// created); multiple matches are all returned.
    #[must_use]
    pub fn orders_for(&self, certificate_name: &str) -> Vec<&OrderRecord> {
        self.orders
            .iter()
            .filter(|order| order.certificate_name.as_deref() == Some(certificate_name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(name: &str, cert: Option<&str>) -> OrderRecord {
        OrderRecord {
            name: name.to_string(),
            namespace: "storefront".to_string(),
            certificate_name: cert.map(ToString::to_string),
        }
    }

    #[test]
    fn test_exact_match_only() {
        let index = OrderIndex::new(vec![
            order("web-tls-1", Some("web-tls")),
            order("web-tls-staging-1", Some("web-tls-staging")),
            order("web-TLS-1", Some("web-TLS")),
        ]);

        let matched = index.orders_for("web-tls");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "web-tls-1");
    }

    #[test]
    fn test_zero_matches_is_valid() {
        let index = OrderIndex::new(vec![order("web-tls-1", Some("web-tls"))]);
        assert!(index.orders_for("api-tls").is_empty());
    }

    #[test]
    fn test_multiple_matches_all_returned_in_listing_order() {
        let index = OrderIndex::new(vec![
            order("web-tls-1", Some("web-tls")),
            order("unrelated", Some("api-tls")),
            order("web-tls-2", Some("web-tls")),
        ]);

        let matched = index.orders_for("web-tls");
        let names: Vec<&str> = matched.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["web-tls-1", "web-tls-2"]);
    }

    #[test]
    fn test_order_without_annotation_never_matches() {
        let index = OrderIndex::new(vec![order("orphan", None)]);
        assert!(index.orders_for("web-tls").is_empty());
    }
}
