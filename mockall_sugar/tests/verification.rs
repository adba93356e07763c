// vim: tw=80
//! Verifying call counts and ordering with verify!
#![deny(warnings)]

use mockall::automock;
use mockall_sugar::*;

#[automock]
pub trait Methods {
    fn int(&self, i: i32);
    fn number(&self, i: i32) -> i32;
    fn string_result(&self) -> String;
}

mod times {
    use super::*;

    #[test]
    fn bare_count() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), 3);
        m.int(1);
        m.int(2);
        m.int(3);
        m.checkpoint();
    }

    #[test]
    fn exact() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(eq(3)), times(2));
        m.int(3);
        m.int(3);
        m.checkpoint();
    }

    #[test]
    fn once_by_default() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(eq(3)));
        m.int(3);
        m.checkpoint();
    }

    #[test]
    #[should_panic]
    fn too_few() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), times(2));
        m.int(3);
        m.checkpoint();
    }

    #[test]
    #[should_panic]
    fn too_many() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), times(1));
        m.int(3);
        m.int(3);
    }
}

mod bounds {
    use super::*;

    #[test]
    fn at_least_n() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), at_least(2));
        m.int(1);
        m.int(1);
        m.int(1);
        m.checkpoint();
    }

    #[test]
    #[should_panic]
    fn at_least_once_not_called() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), at_least_once());
        m.checkpoint();
    }

    #[test]
    fn at_most_n() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), at_most(2));
        m.int(1);
        m.int(1);
        m.checkpoint();
    }

    #[test]
    #[should_panic]
    fn at_most_exceeded() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), at_most(1));
        m.int(1);
        m.int(1);
    }

    #[test]
    fn never_called() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), never());
        m.checkpoint();
    }

    #[test]
    #[should_panic]
    fn never_but_called() {
        let m = mock_with::<MockMethods, _>(|m| {
            verify!(m.int(_), never());
        });
        m.int(1);
    }
}

#[test]
fn with_answer() {
    let mut m: Mocked<MockMethods> = mock();
    verify!(m.string_result() => returns String::from("x"));
    assert_eq!(m.string_result(), "x");
    m.checkpoint();
}

#[test]
fn default_answer() {
    let mut m: Mocked<MockMethods> = mock();
    verify!(m.string_result());
    assert_eq!(m.string_result(), "");
    m.checkpoint();
}

#[test]
fn clear_invocations_forgets_calls() {
    let mut m: Mocked<MockMethods> = mock();
    verify!(m.int(_), never());
    m.int(1);
    clear_invocations(&m);
    m.checkpoint();
}

#[test]
fn count_so_far() {
    let mut m: Mocked<MockMethods> = mock();
    let verification = verify!(m.int(_), at_least_once());
    m.int(1);
    m.int(2);
    assert_eq!(verification.count(), 2);
}

mod failure_message {
    use super::*;

    #[test]
    #[should_panic(expected = "string_result must be called")]
    fn description() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.string_result()).description("string_result must be called");
        m.checkpoint();
    }

    #[test]
    #[should_panic(expected = "MockMethods.int(eq (3)): expected exactly 2 time(s), but it was called 1 time(s)")]
    fn default_name() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(eq(3)), times(2));
        m.int(3);
        m.checkpoint();
    }

    #[test]
    #[should_panic(expected = "myName.string_result()")]
    fn mock_name() {
        let mut m: Mocked<MockMethods> = mock_named("myName");
        verify!(m.string_result());
        m.checkpoint();
    }
}

#[test]
#[should_panic(expected = "stub_only()")]
fn stub_only() {
    let mut m = Mocked::with_settings(MockMethods::new(),
        with_settings().stub_only());
    verify!(m.int(_));
}

/// verify! counts calls without changing how they're answered
mod with_stubs {
    use super::*;

    #[test]
    fn broader_stub_answers() {
        let mut m = mock_with::<MockMethods, _>(|m| {
            on!(m.number(_) => returns 1);
        });
        verify!(m.number(eq(3)) => returns 2);
        assert_eq!(m.number(3), 1);
        m.checkpoint();
    }

    #[test]
    fn narrower_stub_answers() {
        let mut m = mock_with::<MockMethods, _>(|m| {
            on!(m.number(eq(3)) => returns 1);
        });
        verify!(m.number(_), times(2) => returns 2);
        assert_eq!(m.number(3), 1);
        assert_eq!(m.number(4), 2);
        m.checkpoint();
    }

    #[test]
    fn stubbed_answer_survives() {
        let mut m = mock_with::<MockMethods, _>(|m| {
            on!(m.number(eq(3)) => returns 5);
        });
        verify!(m.number(eq(3)));
        assert_eq!(m.number(3), 5);
        m.checkpoint();
    }

    #[test]
    fn stubbed_later() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.number(_), times(2));
        on!(m.number(eq(3)) => returns 5);
        assert_eq!(m.number(3), 5);
        assert_eq!(m.number(4), 0);
        m.checkpoint();
    }

    #[test]
    fn verifications_in_a_loop() {
        let mut m = mock_with::<MockMethods, _>(|m| {
            on!(m.number(_) => answers |i: i32| i * 10);
        });
        for i in 0..3 {
            verify!(m.number(eq(i)));
        }
        assert_eq!(m.number(2), 20);
        assert_eq!(m.number(0), 0);
        assert_eq!(m.number(1), 10);
        m.checkpoint();
    }

    #[test]
    fn overlapping_verifications() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_), times(2));
        verify!(m.int(eq(1)));
        m.int(1);
        m.int(2);
        m.checkpoint();
    }

    #[test]
    #[should_panic(expected = "expected exactly 1 time(s), but it was called 2 time(s)")]
    fn counted_through_stub() {
        let mut m = mock_with::<MockMethods, _>(|m| {
            on!(m.number(_) => returns 1);
        });
        verify!(m.number(eq(3)));
        m.number(3);
        m.number(3);
        m.checkpoint();
    }
}

mod in_order {
    use super::*;

    #[test]
    fn ok() {
        let mut seq = in_order();
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(eq(1))).in_sequence(&mut seq);
        verify!(m.int(eq(2))).in_sequence(&mut seq);
        m.int(1);
        m.int(2);
    }

    #[test]
    fn across_mocks() {
        let mut seq = in_order();
        let mut a: Mocked<MockMethods> = mock();
        let mut b: Mocked<MockMethods> = mock();
        verify!(a.int(_)).in_sequence(&mut seq);
        verify!(b.int(_)).in_sequence(&mut seq);
        a.int(1);
        b.int(2);
    }

    #[test]
    #[should_panic(expected = "Method sequence violation")]
    fn violation_across_mocks() {
        let mut seq = in_order();
        let mut a: Mocked<MockMethods> = mock();
        let mut b: Mocked<MockMethods> = mock();
        verify!(a.int(_)).in_sequence(&mut seq);
        verify!(b.int(_)).in_sequence(&mut seq);
        b.int(2);
    }

    #[test]
    #[should_panic(expected = "Method sequence violation")]
    fn violation() {
        let mut seq = in_order();
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(eq(1))).in_sequence(&mut seq);
        verify!(m.int(eq(2))).in_sequence(&mut seq);
        m.int(2);
        m.int(1);
    }
}

mod no_more_interactions {
    use super::*;

    #[test]
    fn ok() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_));
        m.int(1);
        verify_no_more_interactions!(m);
    }

    #[test]
    #[should_panic(expected = "No matching expectation found")]
    fn extra_call() {
        let mut m: Mocked<MockMethods> = mock();
        verify!(m.int(_));
        m.int(1);
        verify_no_more_interactions!(m);
        m.int(2);
    }
}
