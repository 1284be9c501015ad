use uuid::Uuid;

pub fn location_id() -> String {
    format!("loc-{}", Uuid::new_v4())
}

pub fn item_id() -> String {
    format!("item-{}", Uuid::new_v4())
}
