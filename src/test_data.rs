#[cfg(test)]
pub const CONFIG_DATA: &str = r#"[site]
name = "Acme Studio"
base_url = "https://acme.example.com"
description = "Websites and SEO for small businesses"

[paths]
template_dir = "res/template"
public_dir = "res/public"

[server]
address = "127.0.0.1"
port = 8001

[cms]
kind = "file"
snapshot_path = "res/content/posts.json"

[blog]
categories = ["Web Development", "SEO"]

[forms]
email_relay_url = "https://relay.example.com/api/v1.0/email/send"
email_service_id = "service_acme"
email_template_id = "template_contact"
email_user_id = "user_acme"
newsletter_url = "https://forms.example.com/f/newsletter"
"#;

#[cfg(test)]
pub const POSTS_JSON: &str = r#"[
  {
    "_id": "post-1",
    "_updatedAt": "2024-02-01T10:00:00Z",
    "title": "Launching a Small Business Site",
    "slug": { "current": "launching-a-small-business-site" },
    "publishedAt": "2024-01-01T09:00:00Z",
    "excerpt": "What to prepare before your first website goes live.",
    "mainImage": { "asset": { "url": "https://cdn.example.com/hero.jpg" } },
    "author": { "name": "Ada Obi" },
    "categories": [ { "_id": "cat-web", "title": "Web Development" } ],
    "body": [
      {
        "_type": "block",
        "style": "h2",
        "children": [ { "_type": "span", "text": "Start with your customers", "marks": [] } ],
        "markDefs": []
      },
      {
        "_type": "block",
        "style": "normal",
        "children": [
          { "_type": "span", "text": "List the three questions your customers ask most, then ", "marks": [] },
          { "_type": "span", "text": "answer them", "marks": ["strong"] },
          { "_type": "span", "text": " on the home page.", "marks": [] }
        ],
        "markDefs": []
      }
    ]
  },
  {
    "_id": "post-2",
    "_updatedAt": "2024-06-02T08:30:00Z",
    "title": "SEO Basics for Beginners",
    "slug": "seo-basics-for-beginners",
    "publishedAt": "2024-06-01T09:00:00Z",
    "excerpt": "Titles, descriptions and sitemaps explained without jargon.",
    "author": { "name": "Sam Reyes" },
    "categories": [ { "_id": "cat-seo", "title": "SEO" } ],
    "body": []
  },
  {
    "_id": "post-3",
    "title": "Choosing a Web Stack",
    "slug": { "current": "choosing-a-web-stack" },
    "publishedAt": "2024-03-15T12:00:00Z",
    "excerpt": "Hosted builders, static generators or a custom build: how to pick.",
    "categories": [
      { "_id": "cat-web", "title": "Web Development" },
      { "_id": "cat-tools", "title": "Tools & Resources" }
    ]
  }
]"#;
