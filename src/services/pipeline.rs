// src/services/pipeline.rs

use crate::models::crm::{Lead, LeadStatus, PipelineStage};

/// Splits leads into the seven funnel columns, keeping input order inside
/// each column. Leads without a status go to `new`; none are dropped.
pub fn group_by_status(leads: &[Lead]) -> Vec<PipelineStage> {
    let mut stages: Vec<PipelineStage> = LeadStatus::PIPELINE
        .iter()
        .map(|status| PipelineStage {
            status: *status,
            count: 0,
            leads: Vec::new(),
        })
        .collect();

    for lead in leads {
        let status = lead.status.unwrap_or(LeadStatus::New);
        let column = LeadStatus::PIPELINE
            .iter()
            .position(|s| *s == status)
            .unwrap_or(0);
        stages[column].leads.push(lead.clone());
    }

    for stage in &mut stages {
        stage.count = stage.leads.len();
    }

    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::LeadSource;
    use chrono::Utc;
    use uuid::Uuid;

    fn lead(name: &str, status: Option<LeadStatus>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: "9845012345".into(),
            alternate_phone: None,
            source: LeadSource::Referral,
            status,
            budget: None,
            preferred_location: None,
            requirements: None,
            notes: None,
            assigned_to: None,
            project_id: None,
            unit_id: None,
            channel_partner_id: None,
            next_follow_up: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn names(stage: &PipelineStage) -> Vec<&str> {
        stage.leads.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn columns_follow_funnel_order() {
        let stages = group_by_status(&[]);
        let statuses: Vec<LeadStatus> = stages.iter().map(|s| s.status).collect();
        assert_eq!(statuses, LeadStatus::PIPELINE.to_vec());
        assert!(stages.iter().all(|s| s.count == 0 && s.leads.is_empty()));
    }

    #[test]
    fn keeps_relative_order_inside_a_column() {
        let leads = vec![
            lead("a", Some(LeadStatus::Contacted)),
            lead("b", Some(LeadStatus::New)),
            lead("c", Some(LeadStatus::Contacted)),
            lead("d", Some(LeadStatus::Sold)),
            lead("e", Some(LeadStatus::Contacted)),
        ];
        let stages = group_by_status(&leads);

        assert_eq!(names(&stages[1]), vec!["a", "c", "e"]);
        assert_eq!(stages[1].count, 3);
        assert_eq!(names(&stages[0]), vec!["b"]);
        assert_eq!(names(&stages[5]), vec!["d"]);
    }

    #[test]
    fn missing_status_falls_back_to_new() {
        let leads = vec![
            lead("legacy", None),
            lead("fresh", Some(LeadStatus::New)),
            lead("gone", Some(LeadStatus::Lost)),
        ];
        let stages = group_by_status(&leads);

        assert_eq!(names(&stages[0]), vec!["legacy", "fresh"]);
        assert_eq!(names(&stages[6]), vec!["gone"]);
        let total: usize = stages.iter().map(|s| s.count).sum();
        assert_eq!(total, leads.len());
    }

    #[test]
    fn grouping_is_idempotent() {
        let leads = vec![
            lead("a", Some(LeadStatus::Negotiation)),
            lead("b", None),
            lead("c", Some(LeadStatus::SiteVisit)),
            lead("d", Some(LeadStatus::Negotiation)),
            lead("e", Some(LeadStatus::Booking)),
        ];

        let first = serde_json::to_value(group_by_status(&leads)).unwrap();
        let second = serde_json::to_value(group_by_status(&leads)).unwrap();
        assert_eq!(first, second);
    }
}
