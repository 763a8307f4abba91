//! Snap-Through Example - Shallow Two-Truss Arch
//!
//! Traces the equilibrium path of the classic two-bar snap-through problem
//! under load control, then brackets the limit point. The analytic critical
//! load factor is 1 / (3 sqrt(6)) = 0.13608.

use anyhow::Result;
use fea_buckling::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Snap-Through Example: Shallow Two-Truss Arch ===\n");

    // Create the arch
    //
    //          B  <- unit load, downward
    //         / \
    //        /   \
    //       A     C
    //       ^     ^
    //     Fixed  Fixed
    //
    let mut model = Model::new();
    model.add_node("A", Node::new(0.0, 0.0, 0.0))?;
    model.add_node("B", Node::new(1.0, 1.0, 0.0))?;
    model.add_node("C", Node::new(2.0, 0.0, 0.0))?;
    model.add_support("A", Support::xyz())?;
    model.add_support("B", Support::z())?;
    model.add_support("C", Support::xyz())?;
    model.add_node_load("B", [0.0, -1.0, 0.0])?;
    model.add_truss("1", Truss::new("A", "B", 1.0, 1.0))?;
    model.add_truss("2", Truss::new("B", "C", 1.0, 1.0))?;

    let mut path = TrussPath::new(model)?;
    let mut state = path.root();

    // Walk up the stable branch under load control
    println!("Load-controlled steps:");
    let solver = SolveOptions::load_control().with_determinant();
    for lam in [0.05, 0.10, 0.13] {
        state = path.duplicate(state);
        path.predict_tangential(state, PredictorStrategy::Lambda(lam))?;
        path.solve_equilibrium(state, &solver)?;

        let [_, v, _] = path.displacement(state, "B")?;
        let det = path.determinant(state).unwrap_or(f64::NAN);
        println!("  lambda = {:.4}: v_B = {:+.6}, det(K) = {:+.6}", lam, v, det);
    }

    // Bracket the limit point
    println!("\nBracketing the critical point...");
    let outcome = bracket(&mut path, state, &BracketingOptions::default())?;

    let critical = outcome.state;
    let [_, v, _] = path.displacement(critical, "B")?;
    println!("  converged after {} steps ({:?})", outcome.steps, outcome.convergence);
    println!("  critical load factor: {:.8}", path.load_factor(critical));
    println!("  crown displacement:   {:+.8}", v);
    println!("  det(K):               {:+.2e}", path.determinant(critical).unwrap_or(f64::NAN));
    if let Some(eig) = path.state(critical).attendant_eigenvalue {
        println!("  attendant eigenvalue: {:+.2e}", eig);
    }

    // Load-displacement history of the crown
    println!("\nLoad-displacement curve (crown, vertical):");
    for (v, lam) in path.load_displacement_curve(critical, "B", 1)? {
        println!("  v = {:+.6}  lambda = {:.6}", v, lam);
    }

    Ok(())
}
