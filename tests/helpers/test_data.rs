//! Test data builders

use chrono::NaiveDate;
use eventdesk::models::*;

pub fn new_account(username: &str, role: Option<Role>) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        first_name: capitalize(username),
        last_name: "Tester".to_string(),
        email: format!("{}@example.com", username),
        is_superuser: false,
        role,
    }
}

pub fn event_request(title: &str, date: Option<NaiveDate>, max_participants: i32) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        date,
        location: "Main Hall".to_string(),
        short_description: format!("{} for everyone", title),
        max_participants,
        image: None,
    }
}

pub fn png_upload() -> ImageUpload {
    ImageUpload {
        file_name: "Poster.PNG".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
