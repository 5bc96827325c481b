diesel::table! {
    user_identities (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 20]
        provider -> Varchar,
        #[max_length = 191]
        provider_user_id -> Varchar,
        #[max_length = 255]
        provider_email -> Nullable<Varchar>,
        #[max_length = 512]
        access_token -> Nullable<Varchar>,
        #[max_length = 512]
        refresh_token -> Nullable<Varchar>,
        token_expires_at -> Nullable<Timestamptz>,
        linked_at -> Timestamptz,
        last_used_at -> Nullable<Timestamptz>,
        profile -> Nullable<Jsonb>,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 180]
        email -> Nullable<Varchar>,
        roles -> Array<Text>,
        #[max_length = 255]
        password_hash -> Nullable<Varchar>,
        #[max_length = 20]
        primary_provider -> Varchar,
        #[max_length = 150]
        display_name -> Nullable<Varchar>,
        #[max_length = 255]
        avatar_url -> Nullable<Varchar>,
        is_verified -> Bool,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Nullable<Timestamptz>,
        last_login_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(user_identities -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(user_identities, users,);
