/// Integration tests for contact risk scoring
/// Covers the documented score bands, weight overrides and input rejection
use contact_pipeline_utils::config::RiskWeights;
use contact_pipeline_utils::core::risk::{compute_risk_breakdown, compute_risk_score};
use contact_pipeline_utils::errors::AppError;
use contact_pipeline_utils::normalize::normalize_contact;
use serde_json::json;

fn complete_low_risk_contact() -> serde_json::Value {
    json!({
        "email": "maria.silva@gmail.com",
        "first_name": "Maria",
        "last_name": "Silva",
        "company": "Acme Logistics",
        "phone": "+1 (415) 555-0123",
        "source": "website",
        "status": "qualified"
    })
}

#[cfg(test)]
mod score_band_tests {
    use super::*;

    #[test]
    fn test_complete_contact_at_known_provider_is_low_risk() {
        let score = compute_risk_score(&complete_low_risk_contact(), None).unwrap();
        // Only the consumer-provider share of the domain weight remains
        assert_eq!(score, 2);
        assert!(score <= 20);
    }

    #[test]
    fn test_corporate_domain_scores_slightly_higher() {
        let mut contact = complete_low_risk_contact();
        contact["email"] = json!("maria@acme-logistics.com");
        assert_eq!(compute_risk_score(&contact, None).unwrap(), 6);
    }

    #[test]
    fn test_missing_email_saturates_both_email_factors() {
        let mut contact = complete_low_risk_contact();
        contact.as_object_mut().unwrap().remove("email");

        let breakdown = compute_risk_breakdown(&contact, None).unwrap();
        assert_eq!(breakdown.email_domain, 20.0);
        assert_eq!(breakdown.email_format, 15.0);
        // Required email missing: 0.6 of the completeness weight
        assert!((breakdown.data_completeness - 12.0).abs() < 1e-9);
        assert_eq!(compute_risk_score(&contact, None).unwrap(), 47);
    }

    #[test]
    fn test_empty_contact() {
        // 20 + 15 + 10.5 + 5 + 4 + 0 + 20 = 74.5, rounded up
        assert_eq!(compute_risk_score(&json!({}), None).unwrap(), 75);
    }

    #[test]
    fn test_disposable_placeholder_contact_is_high_risk() {
        let contact = json!({
            "email": "test@mailinator.com",
            "company": "n/a",
            "phone": "111-111-1111",
            "source": "spam",
            "status": "Lost"
        });
        // 20 + 12 + 9 + 7 + 8 + 6 + (2 of 4 important missing: 4)
        assert_eq!(compute_risk_score(&contact, None).unwrap(), 66);
    }

    #[test]
    fn test_normalized_contact_can_be_scored() {
        let normalized = normalize_contact(&json!({
            "Email": " Maria.Silva@GMAIL.com ",
            "firstName": "Maria",
            "lastName": "Silva",
            "Company": "Acme Logistics",
            "phone_number": "(415) 555-0123",
            "leadSource": "Website",
            "Status": "QUALIFIED"
        }))
        .unwrap();

        let score = compute_risk_score(&normalized.to_value(), None).unwrap();
        let stamped = normalized.with_risk_score(score);
        assert_eq!(stamped.metadata.risk_score, Some(2.into()));
    }
}

#[cfg(test)]
mod weight_tests {
    use super::*;

    #[test]
    fn test_custom_weights_are_not_renormalized() {
        let weights = RiskWeights::from_options(&json!({
            "emailDomainWeight": 80,
            "emailFormatWeight": 80
        }))
        .unwrap();

        // Both email factors saturate at 80 each; the total is clamped
        assert_eq!(compute_risk_score(&json!({}), Some(&weights)).unwrap(), 100);
    }

    #[test]
    fn test_zero_weights_silence_factors() {
        let weights = RiskWeights {
            email_domain_weight: 0.0,
            email_format_weight: 0.0,
            phone_weight: 0.0,
            company_weight: 0.0,
            source_weight: 0.0,
            status_weight: 0.0,
            data_completeness_weight: 0.0,
        };
        assert_eq!(compute_risk_score(&json!({}), Some(&weights)).unwrap(), 0);
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;

    #[test]
    fn test_non_object_contact_rejected() {
        for input in [json!(null), json!("a@b.com"), json!([1, 2]), json!(7)] {
            assert!(matches!(
                compute_risk_score(&input, None),
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_odd_field_types_are_absorbed() {
        let contact = json!({
            "email": ["not", "a", "string"],
            "phone": {"home": "555"},
            "company": 42,
            "source": true,
            "status": 3
        });
        let score = compute_risk_score(&contact, None).unwrap();
        assert!(score <= 100);
    }
}
