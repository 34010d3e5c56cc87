//! Order Workflow
//!
//! This example walks an order through a compiled state machine.
//!
//! Key concepts:
//! - Declaring states, guarded triggers and entry/exit steps
//! - Reading compiler diagnostics before using a machine
//! - Recovering from a failed entry step with an error handler
//! - Observing transitions through filtered side effects
//! - Exporting the graph as UML and Graphviz text
//!
//! Run with: cargo run --example order_workflow

use statewright::render::dot::DotWriter;
use statewright::{
    BoxError, Definition, Payload, SideEffectFilter, State, StateConfig, TransitionContext,
};

struct Order {
    id: u64,
    state: State,
    items: Vec<String>,
    stock_available: bool,
    notes: Vec<String>,
}

impl Payload for Order {
    fn state(&self) -> State {
        self.state.clone()
    }
}

// Guards
fn has_items(order: &Order, _: &TransitionContext) -> Result<(), BoxError> {
    if order.items.is_empty() {
        Err("order has no items".into())
    } else {
        Ok(())
    }
}

// Operations
fn enter(order: &mut Order, ctx: &TransitionContext) -> Result<(), BoxError> {
    order.state = ctx.destination().clone();
    Ok(())
}

fn reserve_stock(order: &mut Order, _: &TransitionContext) -> Result<(), BoxError> {
    if !order.stock_available {
        return Err(format!("no stock for order {}", order.id).into());
    }
    order.notes.push("stock reserved".to_string());
    Ok(())
}

fn build_definition() -> Result<Definition<Order>, statewright::ConfigurationError> {
    let mut definition = Definition::<Order>::new();

    definition
        .configure_with("NewOrder", StateConfig::new().described("Cart being filled"))?
        .permit_if(has_items, "Submit", "PublishedOrder")?
        .permit("Cancel", "Canceled")?;

    definition
        .configure_with(
            "PublishedOrder",
            StateConfig::new().described("Waiting for fulfilment"),
        )?
        .on_entry_labeled("reserve_stock", reserve_stock)
        .on_entry(enter)
        .on_trigger_entry("Resupply", |order: &mut Order, _| {
            order.notes.push("resupplied".to_string());
            Ok(())
        })
        .on_error_labeled("backorder", |order: &mut Order, ctx, cause| {
            order.notes.push(format!("backordered: {cause}"));
            ctx.set_destination("Backordered");
            order.state = ctx.destination().clone();
            Ok(())
        })
        .permit("Ship", "Shipped")?
        .permit("Cancel", "Canceled")?;

    definition
        .configure("Backordered")?
        .permit("Resupply", "PublishedOrder")?
        .permit("Cancel", "Canceled")?;

    definition.configure("Shipped")?.on_entry(enter);
    definition.configure("Canceled")?.on_entry(enter);

    definition.filtered_side_effect(SideEffectFilter::AFTER_TRANSITION, |phase, order, ctx, ms| {
        println!(
            "  [{phase}] order {} {} -> {} via {} ({ms} ms)",
            order.id,
            ctx.source(),
            ctx.destination(),
            ctx.trigger()
        );
    });

    Ok(definition)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Order Workflow ===\n");

    let definition = build_definition()?;

    println!("UML:\n{}\n", definition.render_uml()?);
    println!("DOT:\n{}", DotWriter::new(&definition).render()?);

    let output = definition.compile();
    for diagnostic in &output.diagnostics {
        println!("{diagnostic}");
    }
    if output.has_errors() {
        return Err("definition has compile errors".into());
    }
    let machine = output.into_machine();

    let mut order = Order {
        id: 12345,
        state: State::new("NewOrder"),
        items: vec![],
        stock_available: false,
        notes: vec![],
    };

    println!("\nStep 1: Submit an empty order");
    if let Err(e) = machine.can_fire(&order, "Submit") {
        println!("  Rejected: {e}");
    }

    println!("\nStep 2: Submit with items, stock missing");
    order.items.push("Book".to_string());
    match machine.fire(&mut order, "Submit") {
        Ok(_) => println!("  Submitted"),
        Err(e) => println!("  Failed [{}]: {e}", e.error_code()),
    }
    println!("  Now in: {}", order.state);

    println!("\nStep 3: Resupply");
    order.stock_available = true;
    machine.fire(&mut order, "Resupply")?;
    println!("  Now in: {}", order.state);

    println!("\nStep 4: Ship");
    let triggers = machine.enumerate_active_triggers(&order)?;
    println!("  Available: {triggers:?}");
    let transition = machine.fire(&mut order, "Ship")?;
    println!("  Transition {} took {:?}", transition.id(), transition.elapsed());

    println!("\nNotes: {}", order.notes.join(", "));

    println!("\n=== Example Complete ===");
    Ok(())
}
