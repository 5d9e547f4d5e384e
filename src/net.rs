//! Withdrawal webhook boundary.
//!
//! The engine debits the amount optimistically before the request goes
//! out (`logic::begin_withdrawal`); this module owns the POST and routes
//! the outcome back — crediting the amount back on any failure.

use serde::Serialize;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use crate::game::MilkGame;

/// Fixed withdrawal intake endpoint.
pub const WITHDRAW_ENDPOINT: &str = "https://eos5yjgvkh1gbmh.m.pipedream.net";

/// Wire shape of the withdrawal request.
#[derive(Serialize, Debug)]
pub struct WithdrawRequest {
    pub ton_address: String,
    pub amount: u64,
}

/// Send an already-debited withdrawal to the webhook. On non-success
/// status or network failure the shell refunds the debit.
#[cfg(target_arch = "wasm32")]
pub fn submit_withdrawal(game: Rc<RefCell<MilkGame>>, address: String, amount: u64) {
    wasm_bindgen_futures::spawn_local(async move {
        let body = WithdrawRequest {
            ton_address: address,
            amount,
        };
        let outcome = send_request(&body).await;
        let mut g = game.borrow_mut();
        match outcome {
            Ok(()) => g.on_withdrawal_accepted(amount),
            Err(err) => {
                web_sys::console::warn_1(
                    &format!("Cow Empire: withdrawal webhook failed: {err}").into(),
                );
                g.on_withdrawal_failed(amount);
            }
        }
    });
}

#[cfg(target_arch = "wasm32")]
async fn send_request(body: &WithdrawRequest) -> Result<(), gloo_net::Error> {
    let response = gloo_net::http::Request::post(WITHDRAW_ENDPOINT)
        .json(body)?
        .send()
        .await?;
    if response.ok() {
        Ok(())
    } else {
        Err(gloo_net::Error::GlooError(format!(
            "webhook returned status {}",
            response.status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_shape() {
        let body = WithdrawRequest {
            ton_address: "UQabc123".into(),
            amount: 150,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"ton_address":"UQabc123","amount":150}"#);
    }
}
