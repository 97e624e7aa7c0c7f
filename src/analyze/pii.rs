// src/analyze/pii.rs
use crate::record::EntityMatch;

/// PII categories surfaced to users. Everything else the service flags
/// (names, organizations, dates, ...) is dropped to avoid over-flagging.
pub const SENSITIVE_PII_CATEGORIES: [&str; 12] = [
    "PhoneNumber",
    "Email",
    "CreditCardNumber",
    "BankAccountNumber",
    "InternationalBankingNumber",
    "USSocialSecurityNumber",
    "USITIN",
    "AadhaarNumber",
    "PassportNumber",
    "UKNHSNumber",
    "CADriversLicenseNumber",
    "IPAddress",
];

pub fn is_sensitive(category: &str) -> bool {
    SENSITIVE_PII_CATEGORIES.contains(&category)
}

/// Keep allow-listed entries, preserving service order.
pub fn filter_sensitive(entities: Vec<EntityMatch>) -> Vec<EntityMatch> {
    entities
        .into_iter()
        .filter(|e| is_sensitive(&e.category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ent(text: &str, category: &str) -> EntityMatch {
        EntityMatch {
            text: text.into(),
            category: category.into(),
            confidence: 0.9,
        }
    }

    #[test]
    fn drops_categories_outside_allow_list() {
        let out = filter_sensitive(vec![
            ent("a@b.com", "Email"),
            ent("Contoso", "Organization"),
            ent("555-0100", "PhoneNumber"),
        ]);
        let cats: Vec<&str> = out.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(cats, vec!["Email", "PhoneNumber"]);
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(is_sensitive("IPAddress"));
        assert!(!is_sensitive("ipaddress"));
        assert!(!is_sensitive("Person"));
    }
}
