//! Search terms driving the keyword-based collectors.
//!
//! The forum collector reads the site's latest-topics feed directly and does
//! not take keywords.

/// Queries issued against the video platform's search endpoint.
pub const YOUTUBE_KEYWORDS: &[&str] = &[
    "n8n workflow",
    "n8n automation tutorial",
    "n8n slack integration",
    "n8n google sheets",
    "n8n webhook automation",
    "n8n email automation",
    "n8n airtable",
    "n8n notion integration",
    "n8n discord bot",
    "n8n telegram bot",
    "n8n crm automation",
    "n8n workflow examples",
    "n8n zapier alternative",
    "n8n make alternative",
];

/// Terms queried against the interest-over-time trend service.
pub const TREND_KEYWORDS: &[&str] = &[
    "n8n workflow",
    "n8n automation",
    "n8n slack",
    "n8n gmail",
    "n8n google sheets",
    "n8n webhook",
    "n8n airtable",
    "n8n notion",
    "n8n discord",
    "n8n telegram",
    "n8n stripe",
    "n8n shopify",
    "n8n wordpress",
    "n8n salesforce",
];
