//! Diesel schema definitions.

diesel::table! {
    fcm_tokens (id) {
        id -> Integer,
        owner_id -> Text,
        pet_id -> Nullable<Text>,
        token -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    access_tokens (token) {
        token -> Text,
        user_id -> Text,
        expires_at -> Nullable<Timestamp>,
    }
}
