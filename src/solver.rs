//! Nonlinear solution steps for the truss path
//!
//! Newton-Raphson correctors under load control (fixed load factor) or
//! arc-length control (spherical constraint on the combined displacement /
//! load-factor increment, solved via the bordered system), the tangential
//! predictors that seed them, and the det(K) / attendant eigenvalue
//! evaluations.

use log::debug;

use crate::analysis::{ControlStrategy, PredictorStrategy, SolveOptions};
use crate::error::{BucklingError, BucklingResult};
use crate::math::{self, Mat, Vec as DVec};
use crate::path::{EquilibriumPath, StateId, TrussPath};

impl TrussPath {
    /// Assemble the internal force vector and tangent stiffness matrix for
    /// the given global displacement vector
    pub(crate) fn assemble(&self, d: &DVec) -> (DVec, Mat) {
        let n = self.model.dof_count();
        let mut f_int = DVec::zeros(n);
        let mut k = Mat::zeros(n, n);

        for truss in self.model.trusses.values() {
            let dof_a = self.dof(&truss.node_a, 0).expect("validated on insert");
            let dof_b = self.dof(&truss.node_b, 0).expect("validated on insert");
            let xa = self.model.nodes[&truss.node_a].coords();
            let xb = self.model.nodes[&truss.node_b].coords();
            let ua = [d[dof_a], d[dof_a + 1], d[dof_a + 2]];
            let ub = [d[dof_b], d[dof_b + 1], d[dof_b + 2]];

            let f_e = truss.internal_forces(&xa, &xb, &ua, &ub);
            let k_e = truss.tangent_stiffness(&xa, &xb, &ua, &ub);

            for i in 0..3 {
                f_int[dof_a + i] += f_e[i];
                f_int[dof_b + i] += f_e[i + 3];
                for j in 0..3 {
                    k[(dof_a + i, dof_a + j)] += k_e[(i, j)];
                    k[(dof_a + i, dof_b + j)] += k_e[(i, j + 3)];
                    k[(dof_b + i, dof_a + j)] += k_e[(i + 3, j)];
                    k[(dof_b + i, dof_b + j)] += k_e[(i + 3, j + 3)];
                }
            }
        }

        (f_int, k)
    }

    /// Assemble the linear (small-displacement) stiffness matrix
    fn assemble_linear(&self) -> Mat {
        let n = self.model.dof_count();
        let mut k = Mat::zeros(n, n);

        for truss in self.model.trusses.values() {
            let dof_a = self.dof(&truss.node_a, 0).expect("validated on insert");
            let dof_b = self.dof(&truss.node_b, 0).expect("validated on insert");
            let xa = self.model.nodes[&truss.node_a].coords();
            let xb = self.model.nodes[&truss.node_b].coords();
            let k_e = truss.linear_stiffness(&xa, &xb);

            for i in 0..3 {
                for j in 0..3 {
                    k[(dof_a + i, dof_a + j)] += k_e[(i, j)];
                    k[(dof_a + i, dof_b + j)] += k_e[(i, j + 3)];
                    k[(dof_b + i, dof_a + j)] += k_e[(i + 3, j)];
                    k[(dof_b + i, dof_b + j)] += k_e[(i + 3, j + 3)];
                }
            }
        }

        k
    }

    /// First-order linear solve at the state's load factor
    pub fn perform_linear_solution_step(&mut self, state: StateId) -> BucklingResult<()> {
        let lam = self.states[state].lam;
        let k = self.assemble_linear();
        let k_ff = math::submatrix(&k, &self.free);
        let p = math::subvector(&self.f_hat, &self.free) * lam;
        let d_f = math::solve_linear_system(&k_ff, &p).ok_or(BucklingError::SingularMatrix)?;

        let mut d = DVec::zeros(self.model.dof_count());
        for (i, &dof) in self.free.iter().enumerate() {
            d[dof] = d_f[i];
        }
        self.states[state].d = d;
        self.invalidate(state);
        Ok(())
    }

    /// Advance a state's unknowns by a tangential predictor
    pub(crate) fn apply_tangential_prediction(
        &mut self,
        state: StateId,
        strategy: PredictorStrategy,
    ) -> BucklingResult<()> {
        let lam = self.states[state].lam;
        let d = self.states[state].d.clone();

        let (_, k) = self.assemble(&d);
        let k_ff = math::submatrix(&k, &self.free);
        let f_f = math::subvector(&self.f_hat, &self.free);
        let t_u =
            math::solve_linear_system(&k_ff, &f_f).ok_or(BucklingError::SingularMatrix)?;

        let factor = match strategy {
            PredictorStrategy::Lambda(value) => value - lam,
            PredictorStrategy::LoadControl => {
                let (_, d_lam) = self.previous_increment(state)?;
                d_lam
            }
            PredictorStrategy::ArcLength => {
                let (d_disp, d_lam) = self.previous_increment(state)?;
                let s_prev = (d_disp.norm_squared() + d_lam * d_lam).sqrt();
                if s_prev == 0.0 {
                    return Err(BucklingError::InvalidInput(
                        "arc-length prediction needs a nonzero previous increment".to_string(),
                    ));
                }
                let t_norm = (t_u.norm_squared() + 1.0).sqrt();
                let mut factor = s_prev / t_norm;
                // keep moving forward along the path
                let direction = t_u.dot(&math::subvector(&d_disp, &self.free)) + d_lam;
                if direction < 0.0 {
                    factor = -factor;
                }
                factor
            }
        };

        let s = &mut self.states[state];
        for (i, &dof) in self.free.iter().enumerate() {
            s.d[dof] += t_u[i] * factor;
        }
        s.lam += factor;
        self.invalidate(state);
        Ok(())
    }

    /// The increment leading up to this state's predecessor, i.e. the last
    /// fully solved step on the path before a fresh duplicate
    fn previous_increment(&self, state: StateId) -> BucklingResult<(DVec, f64)> {
        let prev = self.previous(state)?;
        let prev2 = self.previous(prev)?;
        let d_disp = &self.states[prev].d - &self.states[prev2].d;
        let d_lam = self.states[prev].lam - self.states[prev2].lam;
        Ok((d_disp, d_lam))
    }

    /// Run corrector iterations to equilibrium
    pub(crate) fn run_corrector(
        &mut self,
        state: StateId,
        options: &SolveOptions,
    ) -> BucklingResult<()> {
        match options.strategy {
            ControlStrategy::LoadControl => self.correct_load_control(state, options)?,
            ControlStrategy::ArcLengthControl => self.correct_arc_length(state, options)?,
        }

        self.invalidate(state);
        if options.solve_determinant {
            self.compute_det_k(state)?;
        }
        if options.solve_attendant_eigenvalue {
            self.compute_attendant_eigenpair(state)?;
        }
        Ok(())
    }

    fn correct_load_control(
        &mut self,
        state: StateId,
        options: &SolveOptions,
    ) -> BucklingResult<()> {
        let lam = self.states[state].lam;
        let mut d = self.states[state].d.clone();
        let f_f = math::subvector(&self.f_hat, &self.free);

        for iteration in 0..options.max_iterations {
            let (f_int, k) = self.assemble(&d);
            let r = math::subvector(&f_int, &self.free) - &f_f * lam;
            if r.norm() < options.tolerance {
                debug!("load control converged after {} iterations", iteration);
                self.states[state].d = d;
                return Ok(());
            }
            let k_ff = math::submatrix(&k, &self.free);
            let delta =
                math::solve_linear_system(&k_ff, &(-&r)).ok_or(BucklingError::SingularMatrix)?;
            for (i, &dof) in self.free.iter().enumerate() {
                d[dof] += delta[i];
            }
        }

        Err(BucklingError::ConvergenceFailed(options.max_iterations))
    }

    fn correct_arc_length(
        &mut self,
        state: StateId,
        options: &SolveOptions,
    ) -> BucklingResult<()> {
        let prev = self.previous(state)?;
        let d_prev = self.states[prev].d.clone();
        let lam_prev = self.states[prev].lam;

        let mut d = self.states[state].d.clone();
        let mut lam = self.states[state].lam;

        // constraint radius from the increment the predictor (or the
        // bisection interpolation) put on this state
        let s_sq = (&d - &d_prev).norm_squared() + (lam - lam_prev).powi(2);
        if s_sq == 0.0 {
            return Err(BucklingError::InvalidInput(
                "arc-length control needs a nonzero starting increment".to_string(),
            ));
        }

        let f_f = math::subvector(&self.f_hat, &self.free);
        let n = self.free.len();

        for iteration in 0..options.max_iterations {
            let (f_int, k) = self.assemble(&d);
            let r = math::subvector(&f_int, &self.free) - &f_f * lam;

            let delta_d = math::subvector(&(&d - &d_prev), &self.free);
            let delta_lam = lam - lam_prev;
            let c = delta_d.norm_squared() + delta_lam * delta_lam - s_sq;

            if r.norm() < options.tolerance && c.abs() < options.tolerance {
                debug!("arc-length control converged after {} iterations", iteration);
                self.states[state].d = d;
                self.states[state].lam = lam;
                return Ok(());
            }

            // bordered system: equilibrium rows plus the constraint row
            let k_ff = math::submatrix(&k, &self.free);
            let mut a = Mat::zeros(n + 1, n + 1);
            let mut rhs = DVec::zeros(n + 1);
            for i in 0..n {
                for j in 0..n {
                    a[(i, j)] = k_ff[(i, j)];
                }
                a[(i, n)] = -f_f[i];
                a[(n, i)] = 2.0 * delta_d[i];
                rhs[i] = -r[i];
            }
            a[(n, n)] = 2.0 * delta_lam;
            rhs[n] = -c;

            let x = math::solve_linear_system(&a, &rhs).ok_or(BucklingError::SingularMatrix)?;
            for (i, &dof) in self.free.iter().enumerate() {
                d[dof] += x[i];
            }
            lam += x[n];
        }

        Err(BucklingError::ConvergenceFailed(options.max_iterations))
    }

    /// Evaluate and store det(K) on the free DOFs
    pub(crate) fn compute_det_k(&mut self, state: StateId) -> BucklingResult<f64> {
        let d = self.states[state].d.clone();
        let (_, k) = self.assemble(&d);
        let det = math::determinant(&math::submatrix(&k, &self.free));
        self.states[state].det_k = Some(det);
        Ok(det)
    }

    /// Evaluate and store the eigenvalue of smallest magnitude of the free
    /// tangent block along with its mode shape
    pub(crate) fn compute_attendant_eigenpair(&mut self, state: StateId) -> BucklingResult<f64> {
        let d = self.states[state].d.clone();
        let (_, k) = self.assemble(&d);
        let k_ff = math::submatrix(&k, &self.free);
        let (value, vector) = math::smallest_eigenpair(&k_ff).ok_or_else(|| {
            BucklingError::InvalidInput("model has no free DOFs".to_string())
        })?;

        let mut mode = DVec::zeros(self.model.dof_count());
        for (i, &dof) in self.free.iter().enumerate() {
            mode[dof] = vector[i];
        }
        self.states[state].attendant_eigenvalue = Some(value);
        self.states[state].attendant_mode = Some(mode);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::analysis::{PredictorStrategy, SolveOptions};
    use crate::elements::{Node, Support, Truss};
    use crate::model::Model;
    use crate::path::{EquilibriumPath, TrussPath};

    /// Shallow two-truss arch with a limit point at lam = 1 / (3 sqrt(6))
    fn arch_path() -> TrussPath {
        let mut model = Model::new();
        model.add_node("A", Node::new(0.0, 0.0, 0.0)).unwrap();
        model.add_node("B", Node::new(1.0, 1.0, 0.0)).unwrap();
        model.add_node("C", Node::new(2.0, 0.0, 0.0)).unwrap();
        model.add_support("A", Support::xyz()).unwrap();
        model.add_support("B", Support::z()).unwrap();
        model.add_support("C", Support::xyz()).unwrap();
        model.add_node_load("B", [0.0, -1.0, 0.0]).unwrap();
        model.add_truss("1", Truss::new("A", "B", 1.0, 1.0)).unwrap();
        model.add_truss("2", Truss::new("B", "C", 1.0, 1.0)).unwrap();
        TrussPath::new(model).unwrap()
    }

    #[test]
    fn test_linear_step_matches_closed_form() {
        // For the unit arch the linear vertical stiffness at B is 1/sqrt(2),
        // so v = -lam * sqrt(2)
        let mut path = arch_path();
        let root = path.root();
        let state = path.duplicate(root);
        path.set_load_factor(state, 0.05);
        path.perform_linear_solution_step(state).unwrap();
        let v = path.displacement(state, "B").unwrap()[1];
        assert_relative_eq!(v, -0.05 * std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_load_control_step_reaches_equilibrium() {
        let mut path = arch_path();
        let root = path.root();
        let state = path.duplicate(root);
        path.predict_tangential(state, PredictorStrategy::Lambda(0.1))
            .unwrap();
        path.solve_equilibrium(state, &SolveOptions::load_control().with_determinant())
            .unwrap();

        // v solves (v^2 + 2 v)(1 + v) = -2 sqrt(2) lam; at lam = 0.1 the
        // stable root is near -0.1945
        let v = path.displacement(state, "B").unwrap()[1];
        assert_relative_eq!(v, -0.1945, epsilon = 1e-3);
        let u = path.displacement(state, "B").unwrap()[0];
        assert_relative_eq!(u, 0.0, epsilon = 1e-10);
        assert!(path.determinant(state).unwrap() > 0.0);
    }

    #[test]
    fn test_arc_length_step_follows_path() {
        let mut path = arch_path();
        let root = path.root();

        let first = path.duplicate(root);
        path.predict_tangential(first, PredictorStrategy::Lambda(0.05))
            .unwrap();
        path.solve_equilibrium(first, &SolveOptions::load_control().with_determinant())
            .unwrap();

        let second = path.duplicate(first);
        path.predict_tangential(second, PredictorStrategy::ArcLength)
            .unwrap();
        path.solve_equilibrium(
            second,
            &SolveOptions::arc_length().with_determinant(),
        )
        .unwrap();

        // the step advanced the path and stayed on the equilibrium branch
        assert!(path.load_factor(second) > path.load_factor(first));
        let v_first = path.displacement(first, "B").unwrap()[1];
        let v_second = path.displacement(second, "B").unwrap()[1];
        assert!(v_second < v_first);

        // arc length of the converged step matches the previous increment
        let inc_first = path.increment_norm(first).unwrap();
        let d_lam_first = path.load_factor(first);
        let s_first = (inc_first.powi(2) + d_lam_first.powi(2)).sqrt();
        let inc_second = path.increment_norm(second).unwrap();
        let d_lam_second = path.load_factor(second) - path.load_factor(first);
        let s_second = (inc_second.powi(2) + d_lam_second.powi(2)).sqrt();
        assert_relative_eq!(s_first, s_second, epsilon = 1e-6);
    }

    #[test]
    fn test_determinant_at_rest_state() {
        // At the undeformed state K is diag(1/sqrt(2), 1/sqrt(2)) on the
        // free DOFs, so det(K) = 0.5
        let mut path = arch_path();
        let root = path.root();
        let det = path.solve_determinant(root).unwrap();
        assert_relative_eq!(det, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_attendant_eigenvalue_at_rest_state() {
        let mut path = arch_path();
        let root = path.root();
        let value = path.compute_attendant_eigenpair(root).unwrap();
        assert_relative_eq!(value, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert!(path.state(root).attendant_mode.is_some());
    }

    #[test]
    fn test_scale_prediction_interpolates() {
        let mut path = arch_path();
        let root = path.root();
        let state = path.duplicate(root);
        path.predict_tangential(state, PredictorStrategy::Lambda(0.1))
            .unwrap();
        let v_full = path.displacement(state, "B").unwrap()[1];
        path.scale_prediction(state, 0.5).unwrap();
        assert_relative_eq!(path.load_factor(state), 0.05, epsilon = 1e-12);
        assert_relative_eq!(
            path.displacement(state, "B").unwrap()[1],
            v_full / 2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_predictor_needs_previous_increment() {
        let mut path = arch_path();
        let root = path.root();
        let state = path.duplicate(root);
        let err = path
            .predict_tangential(state, PredictorStrategy::ArcLength)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::BucklingError::MissingPredecessor(_)
        ));
    }
}
