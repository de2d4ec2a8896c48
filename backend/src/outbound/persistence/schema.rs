//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations`. The trigger-maintained
//! `recipes.search_vector` column is left out: Diesel has no `tsvector` type
//! and the column is only read through raw SQL in the text search.

diesel::table! {
    /// Registered accounts. `email` carries a unique constraint.
    users (id) {
        id -> Uuid,
        name -> Text,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        created_date -> Timestamptz,
        last_modified_date -> Timestamptz,
        recipe_ids -> Array<Uuid>,
        shared_recipe_ids -> Array<Uuid>,
        /// Label to address-list mapping stored as a JSON object.
        email_distros -> Jsonb,
    }
}

diesel::table! {
    /// Recipes. Rows are never removed; `deleted` marks soft deletion.
    recipes (id) {
        id -> Uuid,
        name -> Text,
        num_ingredients -> Int4,
        ingredients -> Array<Text>,
        directions -> Array<Text>,
        prep_time -> Float8,
        cook_time -> Float8,
        /// Serving count or free-text yield.
        servings -> Text,
        tags -> Array<Text>,
        notes -> Array<Text>,
        rating -> Nullable<Float8>,
        favorite -> Bool,
        when_made -> Array<Timestamptz>,
        deleted -> Bool,
        images -> Array<Text>,
        created_date -> Timestamptz,
        last_modified_date -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(recipes, users);
