use std::env;

use crate::models::Category;

#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub provider_type: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub image_src: &'static str,
    pub category: Category,
    pub installed: bool,
}

/// Environment variable whose presence marks a provider as installed.
/// `None` means the provider needs no server-side keys. The zero-config
/// provider is always installed.
fn install_key(provider_type: &str) -> Option<&'static str> {
    match provider_type {
        "zoom_video" => Some("ZOOM_CLIENT_ID"),
        "tandem_video" => Some("TANDEM_CLIENT_ID"),
        "stripe_payment" => Some("STRIPE_CLIENT_ID"),
        "google_calendar" => Some("GOOGLE_API_CREDENTIALS"),
        "office365_calendar" => Some("MS_GRAPH_CLIENT_ID"),
        _ => None,
    }
}

const ENTRIES: &[(&str, &str, &str, Category)] = &[
    ("zoom_video", "Zoom", "Video Conferencing", Category::Conferencing),
    ("daily_video", "Daily.co Video", "Video Conferencing", Category::Conferencing),
    ("tandem_video", "Tandem Video", "Virtual Office | Video Conferencing", Category::Conferencing),
    ("stripe_payment", "Stripe", "Collect payments", Category::Payment),
    ("google_calendar", "Google Calendar", "Calendar", Category::Calendar),
    ("office365_calendar", "Office 365 / Outlook.com Calendar", "Calendar", Category::Calendar),
    ("caldav_calendar", "CalDav Server", "Calendar", Category::Calendar),
    ("apple_calendar", "Apple Calendar", "Calendar", Category::Calendar),
];

/// Ordered provider catalog. Order is the display order within a category.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    entries: Vec<ProviderEntry>,
}

impl ProviderCatalog {
    pub fn new(is_installed: impl Fn(&str) -> bool) -> Self {
        let entries = ENTRIES
            .iter()
            .map(|&(provider_type, title, description, category)| ProviderEntry {
                provider_type,
                title,
                description,
                image_src: image_for(provider_type),
                category,
                installed: is_installed(provider_type),
            })
            .collect();
        Self { entries }
    }

    pub fn from_env() -> Self {
        Self::new(|provider_type| match install_key(provider_type) {
            Some(key) => env::var(key).map(|v| !v.is_empty()).unwrap_or(false),
            None => true,
        })
    }

    pub fn all_installed() -> Self {
        Self::new(|_| true)
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn get(&self, provider_type: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.provider_type == provider_type)
    }
}

fn image_for(provider_type: &str) -> &'static str {
    match provider_type {
        "zoom_video" => "integrations/zoom.svg",
        "daily_video" => "integrations/daily.svg",
        "tandem_video" => "integrations/tandem.svg",
        "stripe_payment" => "integrations/stripe.svg",
        "google_calendar" => "integrations/google-calendar.svg",
        "office365_calendar" => "integrations/outlook.svg",
        "caldav_calendar" => "integrations/caldav.svg",
        "apple_calendar" => "integrations/apple-calendar.svg",
        _ => "integrations/generic.svg",
    }
}
