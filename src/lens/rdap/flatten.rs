//! Entity tree flattening
//!
//! Each entity becomes one page of embed fields. Pages are produced in
//! pre-order (parent, then its children left to right) using an explicit
//! stack so arbitrarily deep nesting cannot exhaust the call stack.

use super::types::{Entity, NO_VALUE};
use crate::message::EmbedField;

/// Field name for an entity's joined roles
pub const ROLES_FIELD_NAME: &str = "Role(s)";

/// The fields shown for a single entity
pub type Page = Vec<EmbedField>;

pub fn flatten(entities: &[Entity]) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut stack: Vec<&Entity> = entities.iter().rev().collect();

    while let Some(entity) = stack.pop() {
        pages.push(entity_page(entity));
        stack.extend(entity.entities.iter().rev());
    }

    pages
}

fn entity_page(entity: &Entity) -> Page {
    let roles = if entity.roles.is_empty() {
        NO_VALUE.to_string()
    } else {
        entity.roles.join(", ")
    };

    let mut page = Vec::with_capacity(entity.card.fields.len() + 1);
    page.push(EmbedField::new(ROLES_FIELD_NAME, roles));
    page.extend(entity.card.fields.iter().map(|f| f.to_embed_field()));
    page
}
