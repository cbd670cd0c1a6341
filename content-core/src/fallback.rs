//! Deterministic stand-in content for when generation fails.

use crate::models::{ContentType, GenerationResponse, PageContent, RequestedContent};

pub fn fallback_content(
    content_type: ContentType,
    city: &str,
    service: &str,
) -> String {
    match content_type {
        ContentType::MetaTitle => format!("{service} Services in {city} | Professional Accountants"),
        ContentType::MetaDescription => format!(
            "Professional {service} services in {city}. Qualified local accountants helping \
             businesses and individuals stay compliant. Contact us today."
        ),
        ContentType::MainContent => format!(
            "Looking for {service} in {city}? Our team of qualified accountants works with \
             sole traders, limited companies and individuals across {city}.\n\n\
             We take care of the detail so you can focus on running your business, from \
             keeping records up to date to meeting every HMRC deadline.\n\n\
             Get in touch to arrange a free initial consultation about {service}."
        ),
    }
}

pub fn fallback_response(
    requested: RequestedContent,
    city: &str,
    service: &str,
) -> GenerationResponse {
    match requested {
        RequestedContent::Part(content_type) => GenerationResponse::Single {
            content: fallback_content(content_type, city, service),
        },
        RequestedContent::All => GenerationResponse::Page(PageContent {
            title: fallback_content(ContentType::MetaTitle, city, service),
            description: fallback_content(ContentType::MetaDescription, city, service),
            main_content: fallback_content(ContentType::MainContent, city, service),
        }),
    }
}
