//! Rule tables for every inbound body.

use super::{Field, Schema, Validate};
use crate::db::models::{
    AdminForm, ApplicationInput, BlogPostInput, LoginForm, OrderInput, PortfolioItemInput,
    SocialInput, StatusPatch, WorkInput, APPLICATION_STATUSES,
};

pub static WORK: Schema = Schema {
    entity: "work",
    fields: &[
        Field::text("title", 1, 200),
        Field::text("description", 10, 5000),
        Field::text("price", 1, 100),
        Field::url_list("images", 1),
        Field::url_list("videos", 0).optional(),
        Field::url("siteUrl").optional(),
        Field::text("clientName", 1, 200),
        Field::text("clientReview", 10, 5000),
        Field::text("category", 1, 100),
        Field::boolean("featured").optional(),
    ],
};

pub static PORTFOLIO_ITEM: Schema = Schema {
    entity: "portfolio item",
    fields: &[
        Field::text("title", 1, 200),
        Field::text("description", 10, 5000),
        Field::url_list("images", 1),
        Field::url_list("videos", 0).optional(),
        Field::url("siteUrl").optional(),
        Field::text("clientName", 1, 200),
        Field::text("clientReview", 10, 5000),
        Field::text("category", 1, 100),
        Field::boolean("featured").optional(),
        Field::integer("order").optional(),
    ],
};

pub static BLOG_POST: Schema = Schema {
    entity: "blog post",
    fields: &[
        Field::text("title", 1, 200),
        Field::text("content", 50, 100_000),
        Field::text("excerpt", 10, 1000),
        Field::url("image").optional(),
        Field::boolean("published").optional(),
    ],
};

pub static SOCIAL: Schema = Schema {
    entity: "social",
    fields: &[
        Field::text("name", 1, 100),
        Field::url("url"),
        Field::text("icon", 1, 50),
        Field::integer("order").optional(),
    ],
};

pub static ADMIN: Schema = Schema {
    entity: "admin",
    fields: &[
        Field::email("email"),
        Field::text("password", 6, 128),
        Field::text("name", 1, 100),
    ],
};

pub static LOGIN: Schema = Schema {
    entity: "login",
    fields: &[Field::email("email"), Field::text("password", 1, 128)],
};

pub static ORDER: Schema = Schema {
    entity: "order",
    fields: &[
        Field::text("name", 2, 100),
        Field::email("email"),
        Field::text("phone", 10, 32),
        Field::text("telegram", 0, 64).optional(),
        Field::text("message", 10, 5000),
        Field::uuid("workId").optional(),
    ],
};

pub static APPLICATION: Schema = Schema {
    entity: "application",
    fields: &[
        Field::text("fullName", 2, 200),
        Field::email("email"),
        Field::text("phone", 10, 32),
        Field::text("telegram", 0, 64).optional(),
        Field::text("projectType", 1, 100),
        Field::text("projectProblem", 10, 5000),
        Field::text("targetAudience", 3, 1000),
        Field::text("budget", 1, 100),
        Field::text("deadline", 1, 100),
        Field::text("description", 20, 10_000),
        Field::text("additionalInfo", 0, 10_000).optional(),
    ],
};

pub static APPLICATION_STATUS: Schema = Schema {
    entity: "application status",
    fields: &[Field::one_of("status", APPLICATION_STATUSES)],
};

macro_rules! validated_by {
    ($($ty:ty => $schema:ident),+ $(,)?) => {
        $(
            impl Validate for $ty {
                fn schema() -> &'static Schema {
                    &$schema
                }
            }
        )+
    };
}

validated_by! {
    WorkInput => WORK,
    PortfolioItemInput => PORTFOLIO_ITEM,
    BlogPostInput => BLOG_POST,
    SocialInput => SOCIAL,
    AdminForm => ADMIN,
    LoginForm => LOGIN,
    OrderInput => ORDER,
    ApplicationInput => APPLICATION,
    StatusPatch => APPLICATION_STATUS,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ApplicationStatus;
    use serde_json::json;

    fn work_body() -> serde_json::Value {
        json!({
            "title": "Online store",
            "description": "Full catalogue with cart and checkout",
            "price": "from 150 000",
            "images": ["https://cdn.example.com/shop.jpg"],
            "siteUrl": "",
            "clientName": "Electro LLC",
            "clientReview": "Delivered on time and works great",
            "category": "E-commerce",
        })
    }

    #[test]
    fn test_work_with_one_image_is_accepted() {
        let work = WorkInput::from_json(&work_body()).unwrap();
        assert_eq!(work.images.len(), 1);
        assert!(work.videos.is_empty());
        assert_eq!(work.site_url, None);
        assert!(!work.featured);
    }

    #[test]
    fn test_work_without_images_is_rejected() {
        let mut body = work_body();
        body["images"] = json!([]);
        let errors = WorkInput::from_json(&body).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["images"]);
    }

    #[test]
    fn test_portfolio_order_defaults_to_zero() {
        let mut body = work_body();
        body.as_object_mut().unwrap().remove("price");
        let item = PortfolioItemInput::from_json(&body).unwrap();
        assert_eq!(item.order, 0);
    }

    #[test]
    fn test_order_form_requires_contact_fields() {
        let errors = OrderInput::from_json(&json!({ "name": "I" })).unwrap_err();
        for field in ["name", "email", "phone", "message"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("workId"));
    }

    #[test]
    fn test_order_form_accepts_example_lead() {
        let order = OrderInput::from_json(&json!({
            "name": "Ivan",
            "email": "ivan@example.com",
            "phone": "+79991234567",
            "message": "Need a landing page",
        }))
        .unwrap();
        assert_eq!(order.telegram, None);
        assert_eq!(order.work_id, None);
    }

    #[test]
    fn test_status_patch_accepts_known_statuses_only() {
        let patch = StatusPatch::from_json(&json!({ "status": "processing" })).unwrap();
        assert_eq!(patch.status, ApplicationStatus::Processing);
        assert!(StatusPatch::from_json(&json!({ "status": "archived" })).is_err());
    }

    #[test]
    fn test_admin_password_minimum() {
        let errors = AdminForm::from_json(&json!({
            "email": "root@example.com",
            "password": "12345",
            "name": "Root",
        }))
        .unwrap_err();
        assert_eq!(errors.get("password"), Some("must be at least 6 characters"));
    }
}
