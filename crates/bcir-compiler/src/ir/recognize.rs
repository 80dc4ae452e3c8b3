//! Shape recognizers over finished IR.
//!
//! Both recognizers match the leading instructions positionally and answer
//! `None` unless the shape holds exactly. Anything after the leading return
//! is unreachable and not inspected.

use bcir_core::Value;

use super::{AnyLocal, BcIr, BcIrInstr, BcIrSlot};

impl BcIr {
    /// The constant returned, if the unit starts by returning a constant.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn returns_constant(&self) -> Option<&Value> {
        match self.instructions.first()? {
            BcIrInstr::Return { value, .. } => value.const_value(),
            _ => None,
        }
    }

    /// The type name tested, if the unit is `return type(param0) == T`.
    ///
    /// The allocated local, the type test's result and the returned value
    /// must all be the same local.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn returns_type_check_of_param0(&self) -> Option<&str> {
        match self.instructions.as_slice() {
            [
                BcIrInstr::AllocSlot { local },
                BcIrInstr::TypeIs {
                    expr: BcIrSlot::Local(param),
                    type_name,
                    result: AnyLocal::Lazy(result),
                    ..
                },
                BcIrInstr::Return {
                    value: BcIrSlot::Lazy(returned),
                    ..
                },
                ..,
            ] if param.index() == 0 && result == local && returned == local => {
                Some(type_name.as_str())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Local;
    use bcir_core::LocOffset;

    const LOC: LocOffset = LocOffset::UNKNOWN;

    fn type_check(param: u32) -> BcIr {
        let mut ir = BcIr::new();
        let result = ir.allocate("result");
        ir.add(BcIrInstr::type_is(LOC, Local::new(param), "string", result));
        ir.add(BcIrInstr::ret(LOC, result));
        ir
    }

    #[test]
    fn constant_return() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Value::Int(5)));
        assert_eq!(ir.returns_constant(), Some(&Value::Int(5)));
        assert_eq!(ir.returns_type_check_of_param0(), None);
    }

    #[test]
    fn non_constant_return() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Local::new(0)));
        assert_eq!(ir.returns_constant(), None);
    }

    #[test]
    fn constant_return_after_other_work() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::cp(LOC, Value::Int(1), Local::new(0)));
        ir.add(BcIrInstr::ret(LOC, Value::Int(5)));
        assert_eq!(ir.returns_constant(), None);
    }

    #[test]
    fn empty_ir() {
        let ir = BcIr::new();
        assert_eq!(ir.returns_constant(), None);
        assert_eq!(ir.returns_type_check_of_param0(), None);
    }

    #[test]
    fn type_check_of_param0() {
        let ir = type_check(0);
        assert_eq!(ir.returns_type_check_of_param0(), Some("string"));
        assert_eq!(ir.returns_constant(), None);
    }

    #[test]
    fn type_check_of_other_param() {
        assert_eq!(type_check(1).returns_type_check_of_param0(), None);
    }

    #[test]
    fn type_check_with_extra_instruction() {
        let mut ir = BcIr::new();
        let result = ir.allocate("result");
        ir.add(BcIrInstr::type_is(LOC, Local::new(0), "string", result));
        ir.add(BcIrInstr::cp(LOC, result, result));
        ir.add(BcIrInstr::ret(LOC, result));
        assert_eq!(ir.returns_type_check_of_param0(), None);
        assert_eq!(ir.returns_constant(), None);
    }

    #[test]
    fn type_check_with_different_locals() {
        let mut ir = BcIr::new();
        let allocated = ir.allocate("a");
        let mut other = BcIr::new();
        let result = other.allocate("b");
        ir.add(BcIrInstr::type_is(LOC, Local::new(0), "string", result));
        ir.add(BcIrInstr::ret(LOC, allocated));
        assert_eq!(ir.returns_type_check_of_param0(), None);

        let mut ir = BcIr::new();
        let allocated = ir.allocate("a");
        ir.add(BcIrInstr::type_is(LOC, Local::new(0), "string", allocated));
        ir.add(BcIrInstr::ret(LOC, result));
        assert_eq!(ir.returns_type_check_of_param0(), None);
    }

    #[test]
    fn type_check_of_lazy_subject() {
        let mut ir = BcIr::new();
        let result = ir.allocate("result");
        let mut other = BcIr::new();
        let subject = other.allocate("subject");
        ir.add(BcIrInstr::type_is(LOC, subject, "string", result));
        ir.add(BcIrInstr::ret(LOC, result));
        assert_eq!(ir.returns_type_check_of_param0(), None);
    }

    #[test]
    fn trailing_instructions_are_ignored() {
        let mut ir = type_check(0);
        ir.add(BcIrInstr::ret(LOC, Value::None));
        assert_eq!(ir.returns_type_check_of_param0(), Some("string"));
    }
}
