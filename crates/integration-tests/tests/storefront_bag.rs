//! Integration tests for the session bag and wishlist.
//!
//! These tests require:
//! - The storefront running at `STOREFRONT_BASE_URL`
//! - `TEST_PRODUCT_ID` naming an unsold product

use boutique_integration_tests::{base_url, location, test_product_id, visitor};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server and TEST_PRODUCT_ID"]
async fn test_bag_add_update_remove() {
    let Some(product_id) = test_product_id() else {
        return;
    };
    let client = visitor();
    let base_url = base_url();
    let id = product_id.to_string();

    let resp = client
        .post(format!("{base_url}/bag/add"))
        .form(&[("product_id", id.as_str()), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to bag");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/bag?notice=added_to_bag");

    let body = client
        .get(format!("{base_url}/bag"))
        .send()
        .await
        .expect("Failed to load bag")
        .text()
        .await
        .expect("body");
    assert!(body.contains("Subtotal (2 items)"));

    let resp = client
        .post(format!("{base_url}/bag/update"))
        .form(&[("product_id", id.as_str()), ("quantity", "0")])
        .send()
        .await
        .expect("Failed to update bag");
    assert_eq!(location(&resp), "/bag?notice=bag_updated");

    let body = client
        .get(format!("{base_url}/bag"))
        .send()
        .await
        .expect("Failed to load bag")
        .text()
        .await
        .expect("body");
    assert!(body.contains("Your bag is empty."));
}

#[tokio::test]
#[ignore = "Requires running storefront server and TEST_PRODUCT_ID"]
async fn test_wishlist_toggle_and_move_to_bag() {
    let Some(product_id) = test_product_id() else {
        return;
    };
    let client = visitor();
    let base_url = base_url();
    let id = product_id.to_string();

    let resp = client
        .post(format!("{base_url}/wishlist/toggle"))
        .form(&[("product_id", id.as_str())])
        .send()
        .await
        .expect("Failed to save product");
    assert_eq!(location(&resp), "/wishlist?notice=saved");

    let resp = client
        .post(format!("{base_url}/wishlist/move-to-bag"))
        .form(&[("product_id", id.as_str())])
        .send()
        .await
        .expect("Failed to move product");
    assert_eq!(location(&resp), "/bag?notice=moved_to_bag");

    let body = client
        .get(format!("{base_url}/wishlist"))
        .send()
        .await
        .expect("Failed to load wishlist")
        .text()
        .await
        .expect("body");
    assert!(body.contains("Nothing saved yet."));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_adding_unknown_product_is_not_found() {
    let client = visitor();
    let resp = client
        .post(format!("{}/bag/add", base_url()))
        .form(&[("product_id", "999999999")])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
