//! Demo data for a fresh store.
//!
//! One user per role and a handful of realistic categories with their
//! SLA budgets and custom fields, so a new install has something to
//! open tickets against. Seed a store once, right after creating it;
//! the unique constraints on emails and category names make a second
//! run fail rather than duplicate.

use rusqlite::{Connection, TransactionBehavior};
use tracing::info;

use crate::{
    Result,
    db::query,
    id,
    model::{Category, FieldDefinition, FieldType, Role, User},
};

/// What [`demo_data`] put into the store.
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub users: Vec<User>,
    pub categories: Vec<Category>,
}

fn demo_users() -> Vec<User> {
    vec![
        User {
            user_id: id::user_id(),
            name: "Ana Gómez".into(),
            email: "ana.gomez@company.example".into(),
            role: Role::Requester,
        },
        User {
            user_id: id::user_id(),
            name: "Carlos Ruiz".into(),
            email: "carlos.ruiz@company.example".into(),
            role: Role::Agent,
        },
        User {
            user_id: id::user_id(),
            name: "María Rodríguez".into(),
            email: "maria.rodriguez@company.example".into(),
            role: Role::Manager,
        },
    ]
}

fn demo_categories() -> Vec<Category> {
    let field = |label: &str, field_type: FieldType, is_required: bool| FieldDefinition {
        field_id: id::field_id(),
        label: label.into(),
        field_type,
        is_required,
    };

    vec![
        Category {
            category_id: id::category_id(),
            name: "GitHub repository access".into(),
            sla_first_response_hours: 2,
            sla_resolution_hours: 8,
            field_definitions: vec![field("Repository name", FieldType::Text, true)],
        },
        Category {
            category_id: id::category_id(),
            name: "CI/CD pipeline failure".into(),
            sla_first_response_hours: 1,
            sla_resolution_hours: 12,
            field_definitions: vec![
                field("Affected pipeline URL", FieldType::Text, true),
                field("Error log", FieldType::Textarea, false),
            ],
        },
        Category {
            category_id: id::category_id(),
            name: "SaaS account provisioning".into(),
            sla_first_response_hours: 8,
            sla_resolution_hours: 48,
            field_definitions: vec![
                field("SaaS name", FieldType::Text, true),
                field("Email for the new account", FieldType::Text, true),
            ],
        },
        Category {
            category_id: id::category_id(),
            name: "Development environment issue".into(),
            sla_first_response_hours: 4,
            sla_resolution_hours: 24,
            field_definitions: vec![field("Environment name", FieldType::Text, true)],
        },
    ]
}

/// Seed the store with one user per role and the demo categories.
///
/// All inserts land in one transaction.
///
/// # Errors
///
/// Returns an error if any insert fails — including uniqueness
/// violations when the store was already seeded.
pub fn demo_data(conn: &mut Connection) -> Result<SeedSummary> {
    let users = demo_users();
    let categories = demo_categories();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    for user in &users {
        query::insert_user(&tx, user)?;
    }
    for category in &categories {
        query::insert_category(&tx, category)?;
    }
    tx.commit()?;

    info!(
        users = users.len(),
        categories = categories.len(),
        "demo data seeded"
    );

    Ok(SeedSummary { users, categories })
}
