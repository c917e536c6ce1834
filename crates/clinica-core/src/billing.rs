use crate::error::{CoreError, Result};
use crate::id::{AppointmentId, InvoiceId, InvoiceItemId, PatientId};
use crate::validation::validate_non_empty;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An invoice issued to a patient, optionally tied to an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub patient_id: PatientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<AppointmentId>,
    pub issue_date: Date,
    pub due_date: Date,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Creates a pending invoice; `due_date` must not precede `issue_date`.
    pub fn new(
        patient_id: PatientId,
        issue_date: Date,
        due_date: Date,
        total_cents: i64,
    ) -> Result<Self> {
        if due_date < issue_date {
            return Err(CoreError::invalid_date_range(issue_date, due_date));
        }
        if total_cents < 0 {
            return Err(CoreError::invalid_field("total_cents", "must not be negative"));
        }
        Ok(Self {
            id: InvoiceId::new(),
            patient_id,
            appointment_id: None,
            issue_date,
            due_date,
            total_cents,
            paid_cents: 0,
            status: InvoiceStatus::Pending,
        })
    }

    pub fn for_appointment(mut self, appointment_id: AppointmentId) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn outstanding_cents(&self) -> i64 {
        (self.total_cents - self.paid_cents).max(0)
    }

    /// Records a payment; the invoice flips to `Paid` once fully covered.
    pub fn record_payment(&mut self, amount_cents: i64) -> Result<()> {
        if amount_cents <= 0 {
            return Err(CoreError::invalid_field(
                "amount_cents",
                "payment must be positive",
            ));
        }
        if self.status == InvoiceStatus::Cancelled {
            return Err(CoreError::invalid_field(
                "status",
                "cannot record a payment on a cancelled invoice",
            ));
        }
        self.paid_cents += amount_cents;
        if self.paid_cents >= self.total_cents {
            self.status = InvoiceStatus::Paid;
        }
        Ok(())
    }
}

/// A line item belonging to exactly one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: InvoiceItemId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

impl InvoiceItem {
    /// Creates a line item; quantity must be greater than zero.
    pub fn new(
        invoice_id: InvoiceId,
        description: impl Into<String>,
        quantity: u32,
        unit_price_cents: i64,
    ) -> Result<Self> {
        if quantity == 0 {
            return Err(CoreError::InvalidQuantity(quantity));
        }
        if unit_price_cents < 0 {
            return Err(CoreError::invalid_field(
                "unit_price_cents",
                "must not be negative",
            ));
        }
        Ok(Self {
            id: InvoiceItemId::new(),
            invoice_id,
            description: validate_non_empty("description", &description.into())?,
            quantity,
            unit_price_cents,
            discount_cents: 0,
        })
    }

    pub fn with_discount(mut self, discount_cents: i64) -> Result<Self> {
        if discount_cents < 0 {
            return Err(CoreError::invalid_field(
                "discount_cents",
                "must not be negative",
            ));
        }
        self.discount_cents = discount_cents;
        Ok(self)
    }

    pub fn line_total_cents(&self) -> i64 {
        (i64::from(self.quantity) * self.unit_price_cents - self.discount_cents).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_invoice_rejects_due_before_issue() {
        let err = Invoice::new(
            PatientId::new(),
            date!(2026 - 03 - 10),
            date!(2026 - 03 - 09),
            10_000,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_invoice_same_day_due_is_allowed() {
        let inv = Invoice::new(
            PatientId::new(),
            date!(2026 - 03 - 10),
            date!(2026 - 03 - 10),
            10_000,
        )
        .unwrap();
        assert_eq!(inv.status, InvoiceStatus::Pending);
        assert_eq!(inv.outstanding_cents(), 10_000);
    }

    #[test]
    fn test_payment_flips_status_when_covered() {
        let mut inv = Invoice::new(
            PatientId::new(),
            date!(2026 - 03 - 10),
            date!(2026 - 04 - 10),
            10_000,
        )
        .unwrap();
        inv.record_payment(4_000).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Pending);
        assert_eq!(inv.outstanding_cents(), 6_000);

        inv.record_payment(6_000).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert_eq!(inv.outstanding_cents(), 0);
    }

    #[test]
    fn test_payment_rejected_on_cancelled_invoice() {
        let mut inv = Invoice::new(
            PatientId::new(),
            date!(2026 - 03 - 10),
            date!(2026 - 04 - 10),
            10_000,
        )
        .unwrap();
        inv.status = InvoiceStatus::Cancelled;
        assert!(inv.record_payment(1_000).is_err());
    }

    #[test]
    fn test_item_rejects_zero_quantity() {
        let err = InvoiceItem::new(InvoiceId::new(), "Consultation", 0, 5_000).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity(0)));
    }

    #[test]
    fn test_item_line_total_with_discount() {
        let item = InvoiceItem::new(InvoiceId::new(), "Consultation", 2, 5_000)
            .unwrap()
            .with_discount(1_500)
            .unwrap();
        assert_eq!(item.line_total_cents(), 8_500);

        // Discount larger than the line floors at zero
        let item = InvoiceItem::new(InvoiceId::new(), "Consultation", 1, 1_000)
            .unwrap()
            .with_discount(5_000)
            .unwrap();
        assert_eq!(item.line_total_cents(), 0);
    }
}
