//! Receipt emails for completed payments.
//!
//! Sent from the webhook handler after an order or donation transitions to
//! `succeeded`. Delivery runs in a spawned task and failures are logged,
//! never propagated: the webhook must still be acknowledged.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::MultiPart,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Donation, Order};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending payment receipts.
#[derive(Clone)]
pub struct ReceiptService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl ReceiptService {
    /// Create a new receipt service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send an order receipt to the customer.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_order_receipt(&self, order: &Order) -> Result<(), EmailError> {
        let subject = format!("Your Harborlight order #{}", order.id);
        let text = order_receipt_text(order);
        let html = order_receipt_html(order);

        self.send(order.customer_email.as_str(), &subject, text, html)
            .await
    }

    /// Send a donation receipt to the donor.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or sent.
    pub async fn send_donation_receipt(&self, donation: &Donation) -> Result<(), EmailError> {
        let subject = "Thank you for supporting Harborlight".to_string();
        let text = donation_receipt_text(donation);
        let html = donation_receipt_html(donation);

        self.send(donation.donor_email.as_str(), &subject, text, html)
            .await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        self.mailer.send(message).await?;
        tracing::info!(to = %to, subject = %subject, "Receipt email sent");
        Ok(())
    }
}

fn order_receipt_text(order: &Order) -> String {
    let mut lines = vec![
        format!("Hi {},", order.customer_name),
        String::new(),
        format!(
            "Thanks for your order! We've received your payment of {}.",
            order.amount
        ),
        String::new(),
    ];
    for item in &order.items {
        lines.push(format!("  {} x {}", item.quantity, item.name));
    }
    lines.push(String::new());
    lines.push("We'll email you again when your order ships.".to_string());
    lines.push(String::new());
    lines.push("- The Harborlight Collective team".to_string());
    lines.join("\n")
}

fn order_receipt_html(order: &Order) -> String {
    let items: String = order
        .items
        .iter()
        .map(|item| format!("<li>{} x {}</li>", item.quantity, escape(&item.name)))
        .collect();
    format!(
        "<p>Hi {},</p>\
         <p>Thanks for your order! We've received your payment of <strong>{}</strong>.</p>\
         <ul>{items}</ul>\
         <p>We'll email you again when your order ships.</p>\
         <p>- The Harborlight Collective team</p>",
        escape(&order.customer_name),
        order.amount,
    )
}

fn donation_receipt_text(donation: &Donation) -> String {
    let name = donation.donor_name.as_deref().unwrap_or("friend");
    format!(
        "Dear {name},\n\n\
         Thank you for your {} gift of {}. Your generosity keeps our programs running.\n\n\
         This email serves as your receipt. No goods or services were provided in exchange for this contribution.\n\n\
         With gratitude,\n\
         The Harborlight Collective team",
        frequency_phrase(donation),
        donation.amount,
    )
}

fn donation_receipt_html(donation: &Donation) -> String {
    let name = donation.donor_name.as_deref().unwrap_or("friend");
    format!(
        "<p>Dear {},</p>\
         <p>Thank you for your {} gift of <strong>{}</strong>. Your generosity keeps our programs running.</p>\
         <p>This email serves as your receipt. No goods or services were provided in exchange for this contribution.</p>\
         <p>With gratitude,<br>The Harborlight Collective team</p>",
        escape(name),
        frequency_phrase(donation),
        donation.amount,
    )
}

const fn frequency_phrase(donation: &Donation) -> &'static str {
    match donation.frequency {
        harborlight_core::DonationFrequency::OneTime => "one-time",
        harborlight_core::DonationFrequency::Monthly => "monthly",
    }
}

/// Minimal HTML escaping for user-supplied names.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use harborlight_core::{
        CurrencyCode, DonationFrequency, DonationId, Email, Money, OrderId, PaymentStatus,
    };

    use super::*;
    use crate::models::order::{OrderItem, ShippingAddress};

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(12),
            payment_intent_id: "pi_test".to_string(),
            status: PaymentStatus::Succeeded,
            amount: Money::from_minor_units(4500, CurrencyCode::Usd).unwrap(),
            customer_email: Email::parse("buyer@example.com").unwrap(),
            customer_name: "Jordan Reyes".to_string(),
            customer_phone: None,
            shipping_address: ShippingAddress {
                line1: "1 Pier Rd".to_string(),
                line2: None,
                city: "Portland".to_string(),
                state: "ME".to_string(),
                postal_code: "04101".to_string(),
                country: "US".to_string(),
            },
            items: vec![OrderItem {
                product_id: "tote-bag".to_string(),
                name: "Canvas Tote".to_string(),
                quantity: 3,
                unit_amount: 1500,
                variation: None,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_donation(name: Option<&str>) -> Donation {
        Donation {
            id: DonationId::new(5),
            payment_intent_id: "pi_test".to_string(),
            status: PaymentStatus::Succeeded,
            amount: Money::from_minor_units(2500, CurrencyCode::Usd).unwrap(),
            donor_email: Email::parse("donor@example.com").unwrap(),
            donor_name: name.map(String::from),
            frequency: DonationFrequency::Monthly,
            message: None,
            anonymous: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_receipt_mentions_total_and_items() {
        let text = order_receipt_text(&sample_order());
        assert!(text.contains("Jordan Reyes"));
        assert!(text.contains("$45.00"));
        assert!(text.contains("3 x Canvas Tote"));
    }

    #[test]
    fn test_donation_receipt_mentions_frequency_and_amount() {
        let text = donation_receipt_text(&sample_donation(Some("Sam")));
        assert!(text.contains("Dear Sam"));
        assert!(text.contains("monthly gift"));
        assert!(text.contains("$25.00"));
    }

    #[test]
    fn test_donation_receipt_without_name() {
        let text = donation_receipt_text(&sample_donation(None));
        assert!(text.contains("Dear friend"));
    }

    #[test]
    fn test_html_escapes_names() {
        let donation = sample_donation(Some("<script>"));
        let html = donation_receipt_html(&donation);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
