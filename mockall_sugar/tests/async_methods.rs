// vim: tw=80
//! Stubbing and verifying async methods
#![deny(warnings)]

use async_trait::async_trait;
use mockall::automock;
use mockall_sugar::*;

#[automock]
#[async_trait]
pub trait SomeInterface {
    async fn suspending(&self) -> i32;
    async fn suspending_with_arg(&self, arg: i32) -> i32;
    fn non_suspending(&self) -> i32;
}

#[test]
fn stub_suspending() {
    let m = mock_with::<MockSomeInterface, _>(|m| {
        on!(m.suspending() => returns 42);
    });
    assert_eq!(run_blocking(m.suspending()), 42);
}

#[test]
fn stub_suspending_with_arg() {
    let m = mock_with::<MockSomeInterface, _>(|m| {
        on!(m.suspending_with_arg(eq(2)) => answers |arg: i32| arg * 10);
    });
    assert_eq!(run_blocking(m.suspending_with_arg(2)), 20);
}

#[test]
fn futures_block_on() {
    let m = mock_with::<MockSomeInterface, _>(|m| {
        on!(m.suspending() => returns_consecutively vec![1, 2]);
    });
    assert_eq!(futures::executor::block_on(m.suspending()), 1);
    assert_eq!(futures::executor::block_on(m.suspending()), 2);
}

#[test]
fn mixed_with_non_suspending() {
    let m = mock_with::<MockSomeInterface, _>(|m| {
        on!(m.suspending() => returns 1);
        on!(m.non_suspending() => returns 2);
    });
    assert_eq!(run_blocking(m.suspending()) + m.non_suspending(), 3);
}

#[test]
fn capture_suspending_arg() {
    let captor = argument_captor::<i32>();
    let m = mock_with::<MockSomeInterface, _>(|m| {
        on!(m.suspending_with_arg(captor.capture()) => returns 0);
    });
    run_blocking(m.suspending_with_arg(5));
    run_blocking(m.suspending_with_arg(6));
    assert_eq!(captor.all_values(), vec![5, 6]);
}

mod verify_blocking {
    use super::*;

    #[test]
    fn once() {
        let mut m: Mocked<MockSomeInterface> = mock();
        verify!(m.suspending() => returns 7);
        assert_eq!(verify_blocking!(m, m.suspending()), 7);
    }

    #[test]
    #[should_panic]
    fn not_enough() {
        let mut m: Mocked<MockSomeInterface> = mock();
        verify!(m.suspending(), times(2) => returns 7);
        verify_blocking!(m, m.suspending());
    }

    #[test]
    #[should_panic(expected = "No matching expectation found")]
    fn checkpointed() {
        let mut m: Mocked<MockSomeInterface> = mock();
        verify!(m.suspending_with_arg(_) => returns 1);
        verify_blocking!(m, m.suspending_with_arg(1));
        run_blocking(m.suspending_with_arg(1));
    }
}
