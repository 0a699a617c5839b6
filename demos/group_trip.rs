//! Group trip example: record shared expenses and print who owes whom

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use split_ledger::utils::MemoryStorage;
use split_ledger::{ExpenseBuilder, Ledger, Participant, SplitPolicy, SubmitError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    println!("🧾 Split Ledger - Group Trip Example\n");

    let storage = MemoryStorage::new();
    let mut ledger = Ledger::new(storage);

    // 1. Register people and a group
    println!("👥 Setting up the group...");
    for (id, name) in [
        ("1", "Arjun Mehta"),
        ("2", "Priya Sharma"),
        ("3", "Rahul Verma"),
        ("4", "Sneha Patel"),
    ] {
        ledger.register_participant(Participant::new(id, name)).await?;
        println!("  ✓ Registered: {}", name);
    }

    let trip = ledger
        .create_group(
            "goa".to_string(),
            "Goa Trip 2024".to_string(),
            "Beach vacation expenses".to_string(),
            vec!["1".into(), "2".into(), "3".into(), "4".into()],
        )
        .await?;
    println!("  ✓ Created group: {} ({} members)\n", trip.name, trip.members.len());

    // 2. Record expenses with each split policy
    println!("💰 Recording expenses...\n");

    let hotel = ExpenseBuilder::new("Hotel Booking", BigDecimal::from(8000), "1")
        .group("goa")
        .category("Accommodation")
        .date(NaiveDate::from_ymd_opt(2024, 1, 20).ok_or("invalid date")?)
        .split_equally(["1", "2", "3", "4"])
        .build();
    ledger.submit_expense(hotel).await?;
    println!("  ✓ Hotel Booking: ₹8000 paid by Arjun, split equally");

    let dinner = ExpenseBuilder::new("Dinner at Beach Shack", BigDecimal::from(3200), "3")
        .group("goa")
        .category("Food")
        .date(NaiveDate::from_ymd_opt(2024, 1, 21).ok_or("invalid date")?)
        .split_by_percentage(vec![
            ("1", BigDecimal::from(25)),
            ("2", BigDecimal::from(25)),
            ("3", BigDecimal::from(30)),
            ("4", BigDecimal::from(20)),
        ])
        .build();
    ledger.submit_expense(dinner).await?;
    println!("  ✓ Dinner at Beach Shack: ₹3200 paid by Rahul, split by percentage");

    // 3. Use a live draft, including a rejected first attempt
    println!("\n📝 Editing a draft...");
    let mut editor = ledger.draft_for_group("goa").await?;
    editor.set_description("Water Sports");
    editor.set_amount_input("450");
    editor.set_payer("4")?;
    editor.set_selected("1", false)?;
    editor.set_policy(SplitPolicy::Exact);
    editor.set_exact_amount("2", BigDecimal::from(150))?;
    editor.set_exact_amount("3", BigDecimal::from(150))?;
    editor.set_exact_amount("4", BigDecimal::from(149))?;

    match ledger.submit_draft(&mut editor).await {
        Err(SubmitError::Rejected(report)) => println!("  ✗ Rejected: {}", report),
        Ok(_) => println!("  ✓ Accepted"),
        Err(other) => return Err(other.into()),
    }

    editor.set_exact_amount("4", BigDecimal::from(150))?;
    let expense = ledger.submit_draft(&mut editor).await?;
    println!("  ✓ Accepted after correction: {} (₹{})", expense.description, expense.amount);

    // 4. Report balances
    println!("\n📊 Balances for {}:", trip.name);
    for line in ledger.group_balance_summary("goa").await? {
        if line.amount > BigDecimal::from(0) {
            println!("  {} is owed ₹{}", line.name, line.amount);
        } else {
            println!("  {} owes ₹{}", line.name, line.amount.abs());
        }
    }

    println!("\n📋 Expenses, newest first:");
    for expense in ledger.group_expenses("goa").await? {
        println!(
            "  {} {} - ₹{} ({})",
            expense.date, expense.description, expense.amount, expense.policy
        );
    }

    println!("\n🌍 Overall positions:");
    for participant in ledger.list_participants().await? {
        let balance = ledger.participant_balance(&participant.id).await?;
        println!("  {}: ₹{}", participant.name, balance);
    }

    Ok(())
}
